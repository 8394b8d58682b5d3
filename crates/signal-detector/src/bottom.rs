//! Bottom detector: 8 metrics where lower values signal a cycle bottom.

use cycle_core::config::BottomThresholds;
use cycle_core::types::{CycleScore, Indicator, IndicatorSnapshot, Side, Signal};
use tracing::{debug, warn};

use crate::convergence::evaluate_convergences;
use crate::tiers::{classify_bottom, describe_bottom_thresholds};

/// Explanatory text for one bottom metric, split by whether it is in the zone.
fn describe(indicator: Indicator, value: f64, in_zone: bool) -> String {
    let (zone, calm) = match indicator {
        Indicator::Mvrv => (
            "market below realized value, historically a buying zone",
            "market above realized value",
        ),
        Indicator::SthMvrv => (
            "short-term holders at loss, capitulation signal",
            "short-term holders in profit",
        ),
        Indicator::MayerMultiple => (
            "price far below 200d MA, deep discount zone",
            "price near or above 200d MA",
        ),
        Indicator::RealizedPriceRatio => (
            "price approaching aggregate cost basis",
            "price well above realized price",
        ),
        Indicator::LthSopr => (
            "long-term holders selling at loss, deep capitulation",
            "long-term holders selling in profit",
        ),
        Indicator::AvivRatio => (
            "market undervalued vs active investors",
            "market fairly valued or above",
        ),
        Indicator::CvddRatio => (
            "price near CVDD floor, strong support zone",
            "price well above CVDD floor",
        ),
        Indicator::TerminalPriceRatio => (
            "price far below terminal, deep value zone",
            "price approaching terminal valuation",
        ),
        Indicator::LthMvrv => ("", ""),
    };
    let precision = if indicator == Indicator::AvivRatio { 3 } else { 2 };
    format!(
        "{} at {:.*} - {}",
        indicator.label(),
        precision,
        value,
        if in_zone { zone } else { calm }
    )
}

/// Scores an [`IndicatorSnapshot`] for cycle-bottom conditions.
#[derive(Debug, Clone, Default)]
pub struct BottomDetector {
    thresholds: BottomThresholds,
}

impl BottomDetector {
    pub fn new(thresholds: BottomThresholds) -> Self {
        if thresholds.inverted {
            warn!("Inverted bottom classification requested; lower-is-stronger ordering still applies");
        }
        Self { thresholds }
    }

    /// Classify all 8 bottom metrics and evaluate convergences.
    pub fn detect(&self, snapshot: &IndicatorSnapshot) -> CycleScore {
        let signals: Vec<Signal> = self
            .thresholds
            .entries()
            .iter()
            .map(|(indicator, triple)| {
                let value = snapshot.value(*indicator);
                let tier = classify_bottom(value, triple);
                Signal {
                    indicator: *indicator,
                    value,
                    tier,
                    threshold: describe_bottom_thresholds(triple),
                    description: describe(*indicator, value, value < triple.watch),
                }
            })
            .collect();

        let convergences = evaluate_convergences(Side::Bottom, &signals);
        let score = CycleScore::new(Side::Bottom, signals, convergences);
        debug!(
            score = score.score,
            convergences = score.convergences.len(),
            "Bottom detection complete"
        );
        score
    }
}
