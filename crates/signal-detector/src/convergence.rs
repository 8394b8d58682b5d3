//! Convergence rule table.
//!
//! Each rule is a predicate over the set of active (STRONG/EXTREME) signals
//! and yields a structured [`ConvergenceFact`]. Rules are not mutually
//! exclusive; facts come out in table order.

use cycle_core::types::{ConvergenceFact, ConvergenceRule, Indicator, Side, Signal};

/// Active signals needed for a confluence fact.
pub const CONFLUENCE_MIN_SIGNALS: usize = 3;

enum Trigger {
    /// At least [`CONFLUENCE_MIN_SIGNALS`] active signals of any kind.
    Confluence,
    /// Every listed indicator is active.
    AllActive(&'static [Indicator]),
}

struct RuleDef {
    rule: ConvergenceRule,
    trigger: Trigger,
}

const BOTTOM_RULES: &[RuleDef] = &[
    RuleDef {
        rule: ConvergenceRule::BottomConfluence,
        trigger: Trigger::Confluence,
    },
    RuleDef {
        rule: ConvergenceRule::BottomValuationConviction,
        trigger: Trigger::AllActive(&[Indicator::Mvrv, Indicator::SthMvrv]),
    },
    RuleDef {
        rule: ConvergenceRule::BottomDeepDiscount,
        trigger: Trigger::AllActive(&[Indicator::MayerMultiple, Indicator::RealizedPriceRatio]),
    },
    RuleDef {
        rule: ConvergenceRule::LthCapitulation,
        trigger: Trigger::AllActive(&[Indicator::LthSopr]),
    },
];

const TOP_RULES: &[RuleDef] = &[
    RuleDef {
        rule: ConvergenceRule::TopConfluence,
        trigger: Trigger::Confluence,
    },
    RuleDef {
        rule: ConvergenceRule::TopDistribution,
        trigger: Trigger::AllActive(&[Indicator::Mvrv, Indicator::SthMvrv]),
    },
    RuleDef {
        rule: ConvergenceRule::TerminalCeiling,
        trigger: Trigger::AllActive(&[Indicator::TerminalPriceRatio]),
    },
    RuleDef {
        rule: ConvergenceRule::EuphoriaPattern,
        trigger: Trigger::AllActive(&[Indicator::MayerMultiple, Indicator::LthMvrv]),
    },
];

/// Evaluate the rule table for one side against classified signals.
pub fn evaluate_convergences(side: Side, signals: &[Signal]) -> Vec<ConvergenceFact> {
    let active: Vec<Indicator> = signals
        .iter()
        .filter(|s| s.tier.is_active())
        .map(|s| s.indicator)
        .collect();

    let rules = match side {
        Side::Bottom => BOTTOM_RULES,
        Side::Top => TOP_RULES,
    };

    rules
        .iter()
        .filter_map(|def| match def.trigger {
            Trigger::Confluence if active.len() >= CONFLUENCE_MIN_SIGNALS => {
                Some(ConvergenceFact::new(def.rule, active.clone()))
            }
            Trigger::Confluence => None,
            Trigger::AllActive(required) => required
                .iter()
                .all(|i| active.contains(i))
                .then(|| ConvergenceFact::new(def.rule, required.to_vec())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycle_core::types::SignalTier;

    fn signals(entries: &[(Indicator, SignalTier)]) -> Vec<Signal> {
        entries
            .iter()
            .map(|&(indicator, tier)| Signal {
                indicator,
                value: 0.0,
                tier,
                threshold: String::new(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_no_facts_without_active_signals() {
        let s = signals(&[
            (Indicator::Mvrv, SignalTier::Watch),
            (Indicator::SthMvrv, SignalTier::Normal),
        ]);
        assert!(evaluate_convergences(Side::Bottom, &s).is_empty());
        assert!(evaluate_convergences(Side::Top, &s).is_empty());
    }

    #[test]
    fn test_bottom_pair_rules() {
        let s = signals(&[
            (Indicator::Mvrv, SignalTier::Strong),
            (Indicator::SthMvrv, SignalTier::Extreme),
            (Indicator::MayerMultiple, SignalTier::Watch),
            (Indicator::RealizedPriceRatio, SignalTier::Strong),
        ]);
        let facts = evaluate_convergences(Side::Bottom, &s);
        let rules: Vec<_> = facts.iter().map(|f| f.rule).collect();
        assert_eq!(
            rules,
            vec![
                ConvergenceRule::BottomConfluence,
                ConvergenceRule::BottomValuationConviction
            ]
        );
        assert_eq!(
            facts[0].indicators,
            vec![Indicator::Mvrv, Indicator::SthMvrv, Indicator::RealizedPriceRatio]
        );
    }

    #[test]
    fn test_single_indicator_rules() {
        let bottom = signals(&[(Indicator::LthSopr, SignalTier::Strong)]);
        let facts = evaluate_convergences(Side::Bottom, &bottom);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].rule, ConvergenceRule::LthCapitulation);

        let top = signals(&[(Indicator::TerminalPriceRatio, SignalTier::Extreme)]);
        let facts = evaluate_convergences(Side::Top, &top);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].rule, ConvergenceRule::TerminalCeiling);
    }

    #[test]
    fn test_top_rules_in_table_order() {
        let s = signals(&[
            (Indicator::Mvrv, SignalTier::Strong),
            (Indicator::SthMvrv, SignalTier::Strong),
            (Indicator::MayerMultiple, SignalTier::Extreme),
            (Indicator::LthMvrv, SignalTier::Strong),
            (Indicator::AvivRatio, SignalTier::Normal),
            (Indicator::TerminalPriceRatio, SignalTier::Strong),
        ]);
        let rules: Vec<_> = evaluate_convergences(Side::Top, &s)
            .iter()
            .map(|f| f.rule)
            .collect();
        assert_eq!(
            rules,
            vec![
                ConvergenceRule::TopConfluence,
                ConvergenceRule::TopDistribution,
                ConvergenceRule::TerminalCeiling,
                ConvergenceRule::EuphoriaPattern,
            ]
        );
    }
}
