//! Top detector: 6 metrics where higher values signal a cycle top.

use cycle_core::config::TopThresholds;
use cycle_core::types::{CycleScore, Indicator, IndicatorSnapshot, Side, Signal};
use tracing::debug;

use crate::convergence::evaluate_convergences;
use crate::tiers::{classify_top, describe_top_thresholds};

fn describe(indicator: Indicator, value: f64, in_zone: bool) -> String {
    let (zone, calm) = match indicator {
        Indicator::Mvrv => (
            "market significantly above realized value, overheated",
            "market not yet overvalued",
        ),
        Indicator::SthMvrv => (
            "short-term holders deeply in profit, distribution likely",
            "short-term holders not yet euphoric",
        ),
        Indicator::MayerMultiple => (
            "price far above 200d MA, overextended",
            "price not overextended vs 200d MA",
        ),
        Indicator::LthMvrv => (
            "long-term holders very profitable, likely distributing",
            "long-term holders not yet at extreme profit",
        ),
        Indicator::AvivRatio => (
            "market at premium to active investor cost basis",
            "market not yet at premium levels",
        ),
        Indicator::TerminalPriceRatio => (
            "price approaching terminal ceiling, extreme caution",
            "price well below terminal ceiling",
        ),
        _ => ("", ""),
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

/// Scores an [`IndicatorSnapshot`] for cycle-top conditions.
#[derive(Debug, Clone, Default)]
pub struct TopDetector {
    thresholds: TopThresholds,
}

impl TopDetector {
    pub fn new(thresholds: TopThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify all 6 top metrics and evaluate convergences.
    pub fn detect(&self, snapshot: &IndicatorSnapshot) -> CycleScore {
        let signals: Vec<Signal> = self
            .thresholds
            .entries()
            .iter()
            .map(|(indicator, triple)| {
                let value = snapshot.value(*indicator);
                Signal {
                    indicator: *indicator,
                    value,
                    tier: classify_top(value, triple),
                    threshold: describe_top_thresholds(triple),
                    description: describe(*indicator, value, value >= triple.watch),
                }
            })
            .collect();

        let convergences = evaluate_convergences(Side::Top, &signals);
        let score = CycleScore::new(Side::Top, signals, convergences);
        debug!(
            score = score.score,
            convergences = score.convergences.len(),
            "Top detection complete"
        );
        score
    }
}
