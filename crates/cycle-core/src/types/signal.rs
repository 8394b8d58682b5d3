//! Signal classification and cycle score types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Indicator;

/// Severity tier of a single indicator, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalTier {
    Normal,
    Watch,
    Strong,
    Extreme,
}

impl SignalTier {
    /// STRONG and EXTREME tiers count towards a score.
    pub fn is_active(&self) -> bool {
        matches!(self, SignalTier::Strong | SignalTier::Extreme)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTier::Normal => "NORMAL",
            SignalTier::Watch => "WATCH",
            SignalTier::Strong => "STRONG",
            SignalTier::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of the cycle a score looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bottom,
    Top,
}

impl Side {
    pub const BOTTOM_MAX_SCORE: u8 = 8;
    pub const TOP_MAX_SCORE: u8 = 6;

    pub fn max_score(&self) -> u8 {
        match self {
            Side::Bottom => Self::BOTTOM_MAX_SCORE,
            Side::Top => Self::TOP_MAX_SCORE,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Side::Bottom => "BOTTOM",
            Side::Top => "TOP",
        }
    }
}

/// Classification result for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub indicator: Indicator,
    pub value: f64,
    pub tier: SignalTier,
    /// Human-readable threshold table.
    pub threshold: String,
    pub description: String,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        self.indicator.label()
    }
}

/// Convergence rules evaluated after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceRule {
    /// Three or more bottom signals active.
    BottomConfluence,
    /// MVRV and STH MVRV both in bottom zone.
    BottomValuationConviction,
    /// Mayer Multiple and Realized Price Ratio both in bottom zone.
    BottomDeepDiscount,
    /// LTH SOPR in bottom zone on its own.
    LthCapitulation,
    /// Three or more top signals active.
    TopConfluence,
    /// MVRV and STH MVRV both in top zone.
    TopDistribution,
    /// Terminal Price Ratio in top zone on its own.
    TerminalCeiling,
    /// Mayer Multiple and LTH MVRV both in top zone.
    EuphoriaPattern,
}

/// A detected co-occurrence of active signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceFact {
    pub rule: ConvergenceRule,
    pub indicators: Vec<Indicator>,
}

impl ConvergenceFact {
    pub fn new(rule: ConvergenceRule, indicators: Vec<Indicator>) -> Self {
        Self { rule, indicators }
    }

    fn names(&self) -> String {
        self.indicators
            .iter()
            .map(|i| i.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render the fact as a narrative line.
    pub fn message(&self) -> String {
        match self.rule {
            ConvergenceRule::BottomConfluence => format!(
                "{} indicators converging in bottom zone: {}",
                self.indicators.len(),
                self.names()
            ),
            ConvergenceRule::BottomValuationConviction => {
                "Both MVRV and STH MVRV in bottom zone - strong conviction signal".to_string()
            }
            ConvergenceRule::BottomDeepDiscount => {
                "Mayer Multiple + Realized Price Ratio convergence - price deeply discounted"
                    .to_string()
            }
            ConvergenceRule::LthCapitulation => {
                "LTH SOPR below 1.0 - long-term holders capitulating (rare and significant)"
                    .to_string()
            }
            ConvergenceRule::TopConfluence => format!(
                "{} top indicators converging: {} - HIGH PROBABILITY TOP",
                self.indicators.len(),
                self.names()
            ),
            ConvergenceRule::TopDistribution => {
                "Both MVRV and STH MVRV in top zone - strong distribution signal".to_string()
            }
            ConvergenceRule::TerminalCeiling => {
                "Price approaching Terminal Price ceiling - historically marks cycle tops"
                    .to_string()
            }
            ConvergenceRule::EuphoriaPattern => {
                "Mayer Multiple + LTH MVRV both elevated - classic euphoria pattern".to_string()
            }
        }
    }
}

impl fmt::Display for ConvergenceFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Aggregate result of one classifier pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleScore {
    pub side: Side,
    /// Count of STRONG or EXTREME signals.
    pub score: u8,
    pub max_score: u8,
    pub signals: Vec<Signal>,
    pub convergences: Vec<ConvergenceFact>,
}

impl CycleScore {
    /// Build a score, deriving the count from the signal tiers.
    pub fn new(side: Side, signals: Vec<Signal>, convergences: Vec<ConvergenceFact>) -> Self {
        let score = signals.iter().filter(|s| s.tier.is_active()).count() as u8;
        Self {
            side,
            score,
            max_score: side.max_score(),
            signals,
            convergences,
        }
    }

    pub fn active_signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.tier.is_active())
    }

    pub fn signal(&self, indicator: Indicator) -> Option<&Signal> {
        self.signals.iter().find(|s| s.indicator == indicator)
    }

    pub fn has_convergence(&self, rule: ConvergenceRule) -> bool {
        self.convergences.iter().any(|c| c.rule == rule)
    }

    pub fn convergence_messages(&self) -> Vec<String> {
        self.convergences.iter().map(|c| c.message()).collect()
    }
}
