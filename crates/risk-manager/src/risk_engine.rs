//! Risk engine: combines bottom and top scores into a recommendation.

use cycle_core::config::{AnalysisConfig, BottomExposureMap, TopSellMap};
use cycle_core::types::{CycleScore, IndicatorSnapshot, Side, TradeDirection};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::triggers::{price_triggers, PriceTrigger};

/// Exposure never recommended below this while distributing.
pub const MIN_DISTRIBUTE_EXPOSURE: u8 = 50;
/// Exposure held when signals are mixed or absent.
pub const BALANCED_EXPOSURE: u8 = 50;

/// Categorical cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Bottom signals only.
    Accumulate,
    /// Top signals only.
    Distribute,
    /// Both sides active.
    Uncertain,
    /// Nothing active.
    Neutral,
}

impl RiskLevel {
    pub fn from_scores(bottom: u8, top: u8) -> Self {
        match (bottom > 0, top > 0) {
            (true, false) => RiskLevel::Accumulate,
            (false, true) => RiskLevel::Distribute,
            (true, true) => RiskLevel::Uncertain,
            (false, false) => RiskLevel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Accumulate => "ACCUMULATE",
            RiskLevel::Distribute => "DISTRIBUTE",
            RiskLevel::Uncertain => "UNCERTAIN",
            RiskLevel::Neutral => "NEUTRAL",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Accumulate => {
                "Recommendation: Increase risk-asset exposure. BTC on-chain data suggests market bottom conditions."
            }
            RiskLevel::Distribute => {
                "Recommendation: Reduce risk-asset exposure. BTC on-chain data suggests market top conditions."
            }
            RiskLevel::Uncertain => {
                "Recommendation: Exercise caution. Mixed signals detected. Hedge with balanced allocation."
            }
            RiskLevel::Neutral => {
                "Recommendation: Hold current positions. No strong directional signal from BTC on-chain data."
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How quickly the recommendation should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    /// Urgency from the larger of the two scores.
    pub fn from_scores(bottom: u8, top: u8) -> Self {
        match bottom.max(top) {
            5.. => Urgency::Critical,
            3..=4 => Urgency::High,
            1..=2 => Urgency::Medium,
            0 => Urgency::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
            Urgency::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub urgency: Urgency,
    pub suggested_action: TradeDirection,
    /// Target percent of the portfolio held in the risk asset.
    pub exposure_percent: u8,
    pub bottom: CycleScore,
    pub top: CycleScore,
    /// Nearest first.
    pub price_triggers: Vec<PriceTrigger>,
    pub rationale: Vec<String>,
}

/// Derives a [`RiskAssessment`] from classifier scores.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    bottom_exposure: BottomExposureMap,
    top_sell: TopSellMap,
}

impl RiskEngine {
    pub fn new(bottom_exposure: BottomExposureMap, top_sell: TopSellMap) -> Self {
        Self {
            bottom_exposure,
            top_sell,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.bottom_exposure, config.top_sell)
    }

    /// Assess a snapshot given its bottom and top scores.
    pub fn assess(
        &self,
        snapshot: &IndicatorSnapshot,
        bottom: CycleScore,
        top: CycleScore,
    ) -> RiskAssessment {
        debug_assert_eq!(bottom.side, Side::Bottom);
        debug_assert_eq!(top.side, Side::Top);

        let level = RiskLevel::from_scores(bottom.score, top.score);
        let urgency = Urgency::from_scores(bottom.score, top.score);
        let suggested_action = suggested_action(level, bottom.score, top.score);
        let exposure_percent = self.exposure(level, bottom.score, top.score);
        let rationale = rationale(level, &bottom, &top);

        info!(
            bottom = bottom.score,
            top = top.score,
            level = %level,
            urgency = %urgency,
            action = %suggested_action,
            exposure = exposure_percent,
            "Risk assessment complete"
        );

        RiskAssessment {
            level,
            urgency,
            suggested_action,
            exposure_percent,
            price_triggers: price_triggers(snapshot),
            rationale,
            bottom,
            top,
        }
    }

    /// Target exposure percent for a level and scores.
    pub fn exposure(&self, level: RiskLevel, bottom: u8, top: u8) -> u8 {
        match level {
            RiskLevel::Accumulate => self.bottom_exposure.lookup(bottom).min(100),
            RiskLevel::Distribute => {
                let sell = self.top_sell.lookup(top).min(100);
                (100 - sell).max(MIN_DISTRIBUTE_EXPOSURE)
            }
            RiskLevel::Uncertain | RiskLevel::Neutral => BALANCED_EXPOSURE,
        }
    }
}

/// Top signals win ties under uncertainty.
fn suggested_action(level: RiskLevel, bottom: u8, top: u8) -> TradeDirection {
    match level {
        RiskLevel::Distribute if top >= 2 => TradeDirection::Sell,
        RiskLevel::Accumulate if bottom >= 2 => TradeDirection::Buy,
        RiskLevel::Uncertain if top >= bottom => TradeDirection::Sell,
        _ => TradeDirection::Hold,
    }
}

fn active_list(score: &CycleScore) -> String {
    score
        .active_signals()
        .map(|s| format!("{} ({})", s.name(), s.tier))
        .collect::<Vec<_>>()
        .join(", ")
}

fn rationale(level: RiskLevel, bottom: &CycleScore, top: &CycleScore) -> Vec<String> {
    let mut lines = vec![
        format!("Risk Level: {}", level),
        format!(
            "Bottom Score: {}/{} | Top Score: {}/{}",
            bottom.score, bottom.max_score, top.score, top.max_score
        ),
    ];

    if bottom.score > 0 {
        lines.push(format!("Active bottom signals: {}", active_list(bottom)));
    }
    if top.score > 0 {
        lines.push(format!("Active top signals: {}", active_list(top)));
    }

    for score in [bottom, top] {
        for fact in &score.convergences {
            lines.push(format!("[{}] {}", score.side.tag(), fact.message()));
        }
    }

    lines.push(level.recommendation().to_string());
    lines
}
