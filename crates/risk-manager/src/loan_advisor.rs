//! Leverage warnings for collateralized lending positions.

use cycle_core::config::AnalysisConfig;
pub use cycle_core::config::LoanAdvisorConfig;
use cycle_core::types::LendingPosition;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::risk_engine::RiskAssessment;

/// Warning severity. Declaration order is display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanSeverity {
    Danger,
    Opportunity,
    Warning,
    Info,
}

impl LoanSeverity {
    /// Sort key: lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            LoanSeverity::Danger => 0,
            LoanSeverity::Opportunity => 1,
            LoanSeverity::Warning => 2,
            LoanSeverity::Info => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanSeverity::Danger => "DANGER",
            LoanSeverity::Opportunity => "OPPORTUNITY",
            LoanSeverity::Warning => "WARNING",
            LoanSeverity::Info => "INFO",
        }
    }
}

impl fmt::Display for LoanSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One advisory message, optionally tied to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanWarning {
    pub severity: LoanSeverity,
    pub message: String,
    pub position: Option<LendingPosition>,
    /// Percent the collateral price can fall before liquidation.
    pub liquidation_distance: Option<f64>,
}

impl LoanWarning {
    fn cycle(severity: LoanSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            position: None,
            liquidation_distance: None,
        }
    }

    fn position(severity: LoanSeverity, message: String, position: &LendingPosition) -> Self {
        Self {
            severity,
            message,
            liquidation_distance: Some(position.liquidation_distance_pct()),
            position: Some(position.clone()),
        }
    }
}

/// Maps a risk assessment and open positions to severity-sorted warnings.
#[derive(Debug, Clone, Default)]
pub struct LoanAdvisor {
    config: LoanAdvisorConfig,
}

impl LoanAdvisor {
    pub fn new(config: LoanAdvisorConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.loan_advisor.clone())
    }

    /// Rules are additive; one state may emit several warnings.
    pub fn assess(
        &self,
        assessment: &RiskAssessment,
        positions: &[LendingPosition],
    ) -> Vec<LoanWarning> {
        let top = assessment.top.score;
        let bottom = assessment.bottom.score;

        let mut warnings = cycle_warnings(bottom, top);

        for position in positions {
            if let Some(warning) = self.ltv_warning(position) {
                warnings.push(warning);
            }

            if top >= self.config.combined_top_score && position.ltv > self.config.combined_ltv {
                warnings.push(LoanWarning::position(
                    LoanSeverity::Danger,
                    format!(
                        "{}: Top signals active AND LTV at {:.1}%. STRONGLY recommend repaying this loan NOW.",
                        position.protocol, position.ltv
                    ),
                    position,
                ));
            }
        }

        warnings.sort_by_key(|w| w.severity.priority());
        debug!(
            count = warnings.len(),
            positions = positions.len(),
            "Loan risk assessment complete"
        );
        warnings
    }

    fn ltv_warning(&self, position: &LendingPosition) -> Option<LoanWarning> {
        let ltv = position.ltv;
        let liq = position.liquidation_price;

        if ltv > self.config.danger_ltv {
            Some(LoanWarning::position(
                LoanSeverity::Danger,
                format!(
                    "{}: LTV at {:.1}% - DANGEROUSLY HIGH. Liquidation at ${:.2}.",
                    position.protocol, ltv, liq
                ),
                position,
            ))
        } else if ltv > self.config.warning_ltv {
            Some(LoanWarning::position(
                LoanSeverity::Warning,
                format!(
                    "{}: LTV at {:.1}%. Consider adding collateral or repaying. Liquidation at ${:.2}.",
                    position.protocol, ltv, liq
                ),
                position,
            ))
        } else if ltv > 0.0 {
            Some(LoanWarning::position(
                LoanSeverity::Info,
                format!(
                    "{}: LTV at {:.1}%. Healthy. Liquidation at ${:.2} ({:.1}% away).",
                    position.protocol,
                    ltv,
                    liq,
                    position.liquidation_distance_pct()
                ),
                position,
            ))
        } else {
            None
        }
    }
}

fn cycle_warnings(bottom: u8, top: u8) -> Vec<LoanWarning> {
    let mut warnings = Vec::new();

    if top == 0 {
        warnings.push(match bottom {
            0 => LoanWarning::cycle(
                LoanSeverity::Info,
                "No cycle signals active. Standard loan management applies; keep LTV at comfortable levels.",
            ),
            1..=2 => LoanWarning::cycle(
                LoanSeverity::Info,
                format!(
                    "Early bottom signals ({}/8) with no top signals. Existing collateral positions look safe; no need to add leverage yet.",
                    bottom
                ),
            ),
            3..=4 => LoanWarning::cycle(
                LoanSeverity::Opportunity,
                format!(
                    "Bottom signals active ({}/8) with no top signals. Relatively safe to hold collateral positions. Consider increasing exposure.",
                    bottom
                ),
            ),
            _ => LoanWarning::cycle(
                LoanSeverity::Opportunity,
                format!(
                    "STRONG BOTTOM ({}/8). Historically a favorable zone to accumulate with conservative LTV.",
                    bottom
                ),
            ),
        });
        return warnings;
    }

    if top < 3 {
        warnings.push(LoanWarning::cycle(
            LoanSeverity::Warning,
            format!(
                "{}/6 top indicators active. Exercise caution with new collateralized loans. Consider reducing LTV ratios.",
                top
            ),
        ));
    }

    if top >= 2 {
        warnings.push(LoanWarning::cycle(
            LoanSeverity::Warning,
            "AVOID taking new loans against the risk asset. Multiple top indicators suggest increased risk of significant drawdown.",
        ));
    }

    if top >= 3 {
        warnings.push(LoanWarning::cycle(
            LoanSeverity::Danger,
            format!(
                "STRONG TOP SIGNAL ({}/6). DELEVERAGE NOW: repay existing loans. Historical data shows 50-80% drawdowns from similar indicator levels.",
                top
            ),
        ));
    }

    if top >= 5 {
        warnings.push(LoanWarning::cycle(
            LoanSeverity::Danger,
            "CRITICAL: REPAY ALL LOANS IMMEDIATELY. Extreme top conditions detected. High probability of cycle top and severe correction.",
        ));
    }

    warnings
}
