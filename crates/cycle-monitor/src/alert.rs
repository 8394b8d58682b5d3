//! Alert classification for a finished assessment.

use chrono::{DateTime, Utc};
use risk_manager::{RiskAssessment, RiskLevel, Urgency};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Headline signal for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSignal {
    StrongBuy,
    Accumulation,
    StrongSell,
    Distribution,
    Attention,
    Neutral,
}

impl AlertSignal {
    pub fn from_assessment(assessment: &RiskAssessment) -> Self {
        let bottom = assessment.bottom.score;
        let top = assessment.top.score;
        match assessment.level {
            RiskLevel::Accumulate if bottom >= 5 => AlertSignal::StrongBuy,
            RiskLevel::Accumulate if bottom >= 2 => AlertSignal::Accumulation,
            RiskLevel::Distribute if top >= 4 => AlertSignal::StrongSell,
            RiskLevel::Distribute if top >= 2 => AlertSignal::Distribution,
            RiskLevel::Accumulate | RiskLevel::Distribute | RiskLevel::Uncertain => {
                AlertSignal::Attention
            }
            RiskLevel::Neutral => AlertSignal::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSignal::StrongBuy => "STRONG BUY",
            AlertSignal::Accumulation => "ACCUMULATION",
            AlertSignal::StrongSell => "STRONG SELL",
            AlertSignal::Distribution => "DISTRIBUTION",
            AlertSignal::Attention => "ATTENTION",
            AlertSignal::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for AlertSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Danger,
    Warning,
    Opportunity,
    Info,
}

impl AlertSeverity {
    pub fn from_assessment(assessment: &RiskAssessment) -> Self {
        match assessment.urgency {
            Urgency::Critical => AlertSeverity::Danger,
            Urgency::High => AlertSeverity::Warning,
            _ if assessment.level == RiskLevel::Accumulate && assessment.bottom.score >= 3 => {
                AlertSeverity::Opportunity
            }
            _ => AlertSeverity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Danger => "DANGER",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Opportunity => "OPPORTUNITY",
            AlertSeverity::Info => "INFO",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub signal: AlertSignal,
    pub severity: AlertSeverity,
    pub generated_at: DateTime<Utc>,
}

impl Alert {
    pub fn from_assessment(assessment: &RiskAssessment, now: DateTime<Utc>) -> Self {
        Self {
            signal: AlertSignal::from_assessment(assessment),
            severity: AlertSeverity::from_assessment(assessment),
            generated_at: now,
        }
    }
}
