//! Price levels at which indicator tiers would change.

use cycle_core::types::IndicatorSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a trigger fires on a move above or below its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerDirection {
    Above,
    Below,
}

impl fmt::Display for TriggerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerDirection::Above => f.write_str("above"),
            TriggerDirection::Below => f.write_str("below"),
        }
    }
}

/// A reference price level worth watching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTrigger {
    pub price: f64,
    pub label: String,
    pub direction: TriggerDirection,
}

impl PriceTrigger {
    /// Signed distance from `current` to the trigger, in percent of `current`.
    pub fn distance_pct(&self, current: f64) -> f64 {
        if current <= 0.0 {
            return 0.0;
        }
        (self.price - current) / current * 100.0
    }
}

#[derive(Clone, Copy)]
enum Reference {
    Sma200,
    RealizedPrice,
    TerminalPrice,
}

impl Reference {
    fn level(self, snapshot: &IndicatorSnapshot) -> f64 {
        match self {
            Reference::Sma200 => snapshot.sma_200,
            Reference::RealizedPrice => snapshot.realized_price,
            Reference::TerminalPrice => snapshot.terminal_price,
        }
    }
}

/// Reference level scaled by a tier breakpoint; direction is fixed.
const SCALED: &[(Reference, f64, &str, TriggerDirection)] = &[
    (Reference::Sma200, 0.7, "Mayer Multiple STRONG bottom (0.7)", TriggerDirection::Below),
    (Reference::Sma200, 2.0, "Mayer Multiple STRONG top (2.0)", TriggerDirection::Above),
    (Reference::Sma200, 2.4, "Mayer Multiple EXTREME top (2.4)", TriggerDirection::Above),
    (Reference::RealizedPrice, 0.8, "MVRV STRONG bottom (0.8)", TriggerDirection::Below),
    (Reference::RealizedPrice, 1.0, "MVRV at Realized Price (1.0)", TriggerDirection::Below),
    (Reference::RealizedPrice, 3.0, "MVRV STRONG top (3.0)", TriggerDirection::Above),
    (Reference::TerminalPrice, 0.8, "Terminal Price 80% (STRONG top zone)", TriggerDirection::Above),
    (Reference::TerminalPrice, 0.9, "Terminal Price 90% (EXTREME top zone)", TriggerDirection::Above),
];

/// Compute price triggers for a snapshot, nearest to the current price first.
///
/// Scaled levels are rounded to whole dollars. Cost-basis levels keep their
/// raw value and point towards the level from the current price. Levels whose
/// reference is not positive are skipped.
pub fn price_triggers(snapshot: &IndicatorSnapshot) -> Vec<PriceTrigger> {
    let price = snapshot.price;

    let mut triggers: Vec<PriceTrigger> = SCALED
        .iter()
        .filter(|(reference, ..)| reference.level(snapshot) > 0.0)
        .map(|&(reference, multiplier, label, direction)| PriceTrigger {
            price: (reference.level(snapshot) * multiplier).round(),
            label: label.to_string(),
            direction,
        })
        .collect();

    let cost_basis = [
        (
            snapshot.sth_cost_basis,
            "STH Cost Basis (short-term holder breakeven)",
        ),
        (
            snapshot.true_market_mean,
            "True Market Mean (fair value midpoint)",
        ),
    ];
    for (level, label) in cost_basis {
        if level > 0.0 {
            triggers.push(PriceTrigger {
                price: level,
                label: label.to_string(),
                direction: if price < level {
                    TriggerDirection::Above
                } else {
                    TriggerDirection::Below
                },
            });
        }
    }

    triggers.sort_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()));
    triggers
}
