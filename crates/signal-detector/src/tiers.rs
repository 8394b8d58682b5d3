//! Threshold classification.

use cycle_core::config::ThresholdTriple;
use cycle_core::types::SignalTier;

/// Classify a value where lower is more severe.
///
/// EXTREME below `extreme`, STRONG below `strong`, WATCH below `watch`,
/// otherwise NORMAL. A value equal to a breakpoint falls in the milder tier.
pub fn classify_bottom(value: f64, t: &ThresholdTriple) -> SignalTier {
    if value >= t.watch {
        SignalTier::Normal
    } else if value >= t.strong {
        SignalTier::Watch
    } else if value >= t.extreme {
        SignalTier::Strong
    } else {
        SignalTier::Extreme
    }
}

/// Classify a value where higher is more severe.
///
/// A value equal to a breakpoint falls in the more severe tier.
pub fn classify_top(value: f64, t: &ThresholdTriple) -> SignalTier {
    if value < t.watch {
        SignalTier::Normal
    } else if value < t.strong {
        SignalTier::Watch
    } else if value < t.extreme {
        SignalTier::Strong
    } else {
        SignalTier::Extreme
    }
}

pub fn describe_bottom_thresholds(t: &ThresholdTriple) -> String {
    format!(
        "< {:.2} (WATCH) / < {:.2} (STRONG) / < {:.2} (EXTREME)",
        t.watch, t.strong, t.extreme
    )
}

pub fn describe_top_thresholds(t: &ThresholdTriple) -> String {
    format!(
        ">= {:.2} (WATCH) / >= {:.2} (STRONG) / >= {:.2} (EXTREME)",
        t.watch, t.strong, t.extreme
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const T_BOTTOM: ThresholdTriple = ThresholdTriple::new(1.0, 0.8, 0.6);
    const T_TOP: ThresholdTriple = ThresholdTriple::new(2.5, 3.0, 3.5);

    #[test]
    fn test_bottom_tiers() {
        assert_eq!(classify_bottom(1.22, &T_BOTTOM), SignalTier::Normal);
        assert_eq!(classify_bottom(0.9, &T_BOTTOM), SignalTier::Watch);
        assert_eq!(classify_bottom(0.7, &T_BOTTOM), SignalTier::Strong);
        assert_eq!(classify_bottom(0.5, &T_BOTTOM), SignalTier::Extreme);
    }

    #[test]
    fn test_bottom_boundaries() {
        assert_eq!(classify_bottom(1.0, &T_BOTTOM), SignalTier::Normal);
        assert_eq!(classify_bottom(0.8, &T_BOTTOM), SignalTier::Watch);
        assert_eq!(classify_bottom(0.6, &T_BOTTOM), SignalTier::Strong);
    }

    #[test]
    fn test_top_tiers_and_boundaries() {
        assert_eq!(classify_top(2.0, &T_TOP), SignalTier::Normal);
        assert_eq!(classify_top(2.5, &T_TOP), SignalTier::Watch);
        assert_eq!(classify_top(3.0, &T_TOP), SignalTier::Strong);
        assert_eq!(classify_top(3.49, &T_TOP), SignalTier::Strong);
        assert_eq!(classify_top(3.5, &T_TOP), SignalTier::Extreme);
    }

    #[test]
    fn test_bottom_is_monotonic() {
        let mut previous = SignalTier::Normal;
        let mut value = 1.5;
        while value > 0.0 {
            let tier = classify_bottom(value, &T_BOTTOM);
            assert!(tier >= previous, "tier decreased at {}", value);
            previous = tier;
            value -= 0.01;
        }
        assert_eq!(previous, SignalTier::Extreme);
    }

    #[test]
    fn test_top_is_monotonic() {
        let mut previous = SignalTier::Normal;
        let mut value = 0.0;
        while value < 5.0 {
            let tier = classify_top(value, &T_TOP);
            assert!(tier >= previous, "tier decreased at {}", value);
            previous = tier;
            value += 0.01;
        }
        assert_eq!(previous, SignalTier::Extreme);
    }

    #[test]
    fn test_threshold_descriptions() {
        assert_eq!(
            describe_bottom_thresholds(&T_BOTTOM),
            "< 1.00 (WATCH) / < 0.80 (STRONG) / < 0.60 (EXTREME)"
        );
        assert_eq!(
            describe_top_thresholds(&T_TOP),
            ">= 2.50 (WATCH) / >= 3.00 (STRONG) / >= 3.50 (EXTREME)"
        );
    }
}
