//! Integration tests for component interactions.
//!
//! These run a snapshot through the detectors, the risk engine, the loan
//! advisor and the trade sizer together.

use chrono::{TimeZone, Utc};
use cycle_core::config::{AnalysisConfig, BottomThresholds};
use cycle_core::sources::{Balances, FileIndicatorSource, IndicatorSource};
use cycle_core::types::{
    ConvergenceRule, IndicatorSnapshot, LendingPosition, SignalTier, TradeDirection,
    STABLE_UNITS_PER_TOKEN,
};
use risk_manager::{LoanAdvisor, LoanSeverity, RiskAssessment, RiskEngine, RiskLevel, Urgency};
use signal_detector::{BottomDetector, TopDetector};
use trading_engine::{TradeSizer, TradeSizerConfig};

/// 2026-02-12 snapshot: three bottom signals, no top signals.
fn real_snapshot() -> IndicatorSnapshot {
    IndicatorSnapshot {
        timestamp: Some(Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap()),
        price: 68_040.0,
        realized_price: 55_548.0,
        sth_cost_basis: 92_000.0,
        sma_200: 101_702.0,
        true_market_mean: 79_124.0,
        cvdd_floor: 46_133.0,
        terminal_price: 290_819.0,
        mvrv: 1.22,
        sth_mvrv: 0.74,
        lth_mvrv: 2.1,
        mayer_multiple: 0.67,
        realized_price_ratio: 1.22,
        lth_sopr: 0.82,
        aviv_ratio: 0.95,
        cvdd_ratio: 1.47,
        terminal_price_ratio: 0.23,
    }
}

/// Top metrics pushed past their extreme thresholds, bottom metrics neutral.
fn euphoric_snapshot() -> IndicatorSnapshot {
    IndicatorSnapshot {
        mvrv: 3.8,
        sth_mvrv: 2.0,
        lth_mvrv: 4.5,
        mayer_multiple: 2.6,
        realized_price_ratio: 3.8,
        lth_sopr: 2.4,
        aviv_ratio: 2.8,
        cvdd_ratio: 5.0,
        terminal_price_ratio: 0.95,
        ..real_snapshot()
    }
}

fn assess(snapshot: &IndicatorSnapshot) -> RiskAssessment {
    let config = AnalysisConfig::default();
    let bottom = BottomDetector::new(config.bottom_thresholds.clone()).detect(snapshot);
    let top = TopDetector::new(config.top_thresholds.clone()).detect(snapshot);
    RiskEngine::from_config(&config).assess(snapshot, bottom, top)
}

fn position(ltv: f64) -> LendingPosition {
    LendingPosition {
        protocol: "kamino".to_string(),
        collateral_mint: "native".to_string(),
        collateral_amount: 50.0,
        debt_mint: "stable".to_string(),
        debt_amount: 3_000.0,
        ltv,
        liquidation_price: 82.0,
        current_price: 140.0,
    }
}

/// Real data end to end: score 3/0, accumulate, HIGH, 40%, BUY.
#[test]
fn test_real_data_scenario() {
    let assessment = assess(&real_snapshot());

    assert_eq!(assessment.bottom.score, 3);
    assert_eq!(assessment.top.score, 0);
    assert_eq!(assessment.level, RiskLevel::Accumulate);
    assert_eq!(assessment.urgency, Urgency::High);
    assert_eq!(assessment.exposure_percent, 40);
    assert_eq!(assessment.suggested_action, TradeDirection::Buy);

    assert!(assessment.bottom.has_convergence(ConvergenceRule::BottomConfluence));
    assert!(assessment.bottom.has_convergence(ConvergenceRule::LthCapitulation));
    assert!(assessment
        .rationale
        .iter()
        .any(|line| line == "Bottom Score: 3/8 | Top Score: 0/6"));
}

/// Every bottom metric sitting exactly on its extreme breakpoint scores 8/8.
#[test]
fn test_all_bottom_metrics_at_extreme_threshold() {
    let t = BottomThresholds::default();
    let snapshot = IndicatorSnapshot {
        mvrv: t.mvrv.extreme,
        sth_mvrv: t.sth_mvrv.extreme,
        mayer_multiple: t.mayer_multiple.extreme,
        realized_price_ratio: t.realized_price_ratio.extreme,
        lth_sopr: t.lth_sopr.extreme,
        aviv_ratio: t.aviv_ratio.extreme,
        cvdd_ratio: t.cvdd_ratio.extreme,
        terminal_price_ratio: t.terminal_price_ratio.extreme,
        ..real_snapshot()
    };
    let assessment = assess(&snapshot);

    assert_eq!(assessment.bottom.score, 8);
    assert_eq!(assessment.exposure_percent, 100);
    assert!(assessment.bottom.has_convergence(ConvergenceRule::BottomConfluence));
    assert!(assessment.bottom.has_convergence(ConvergenceRule::BottomValuationConviction));
    assert!(assessment.bottom.has_convergence(ConvergenceRule::BottomDeepDiscount));
    assert!(assessment.bottom.convergence_messages().len() >= 3);
}

/// Scores always equal the count of STRONG/EXTREME signals.
#[test]
fn test_scores_match_active_signals() {
    for snapshot in [real_snapshot(), euphoric_snapshot()] {
        let assessment = assess(&snapshot);
        for score in [&assessment.bottom, &assessment.top] {
            let active = score
                .signals
                .iter()
                .filter(|s| matches!(s.tier, SignalTier::Strong | SignalTier::Extreme))
                .count();
            assert_eq!(score.score as usize, active);
            assert!(score.score <= score.max_score);
        }
    }
}

#[test]
fn test_full_top_keeps_half_exposure() {
    let assessment = assess(&euphoric_snapshot());

    assert_eq!(assessment.top.score, 6);
    assert_eq!(assessment.bottom.score, 0);
    assert_eq!(assessment.level, RiskLevel::Distribute);
    assert_eq!(assessment.urgency, Urgency::Critical);
    assert_eq!(assessment.exposure_percent, 50);
    assert_eq!(assessment.suggested_action, TradeDirection::Sell);
}

#[test]
fn test_distribute_exposure_never_below_half() {
    let engine = RiskEngine::default();
    for top in 1..=6 {
        assert!(engine.exposure(RiskLevel::Distribute, 0, top) >= 50);
    }
    assert_eq!(engine.exposure(RiskLevel::Accumulate, 8, 0), 100);
    assert_eq!(engine.exposure(RiskLevel::Accumulate, 0, 0), 0);
}

#[test]
fn test_risk_level_truth_table() {
    assert_eq!(RiskLevel::from_scores(2, 0), RiskLevel::Accumulate);
    assert_eq!(RiskLevel::from_scores(0, 2), RiskLevel::Distribute);
    assert_eq!(RiskLevel::from_scores(2, 2), RiskLevel::Uncertain);
    assert_eq!(RiskLevel::from_scores(0, 0), RiskLevel::Neutral);
}

#[test]
fn test_dangerous_ltv_position() {
    let assessment = assess(&real_snapshot());
    let warnings = LoanAdvisor::default().assess(&assessment, &[position(85.0)]);

    let danger: Vec<_> = warnings
        .iter()
        .filter(|w| w.severity == LoanSeverity::Danger)
        .collect();
    assert_eq!(danger.len(), 1);
    assert!(danger[0].message.contains("DANGEROUSLY HIGH"));

    let distance = danger[0].liquidation_distance.unwrap();
    let expected = (140.0 - 82.0) / 140.0 * 100.0;
    assert!((distance - expected).abs() < 1e-9);
}

#[test]
fn test_top_signals_with_moderate_ltv() {
    // MVRV, STH MVRV and Mayer in the STRONG top band
    let snapshot = IndicatorSnapshot {
        mvrv: 3.2,
        sth_mvrv: 1.6,
        mayer_multiple: 2.1,
        realized_price_ratio: 3.2,
        lth_sopr: 1.8,
        lth_mvrv: 2.5,
        aviv_ratio: 1.2,
        cvdd_ratio: 4.0,
        terminal_price_ratio: 0.5,
        ..real_snapshot()
    };
    let assessment = assess(&snapshot);
    assert_eq!(assessment.top.score, 3);

    let warnings = LoanAdvisor::default().assess(&assessment, &[position(60.0)]);
    assert!(warnings
        .iter()
        .any(|w| w.severity == LoanSeverity::Danger && w.message.contains("DELEVERAGE NOW")));
    assert!(warnings.iter().any(|w| w.severity == LoanSeverity::Danger
        && w.message.contains("Top signals active AND LTV")));
}

#[test]
fn test_loan_warnings_sorted_by_severity() {
    let positions = [position(30.0), position(70.0), position(85.0)];
    for snapshot in [real_snapshot(), euphoric_snapshot()] {
        let assessment = assess(&snapshot);
        let warnings = LoanAdvisor::default().assess(&assessment, &positions);
        let priorities: Vec<u8> = warnings.iter().map(|w| w.severity.priority()).collect();
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn test_assessment_drives_trade_size() {
    let assessment = assess(&real_snapshot());
    let balances = Balances {
        native: 0,
        stable: 5_000 * STABLE_UNITS_PER_TOKEN,
        native_price: 140.0,
    };
    let sizer = TradeSizer::new(TradeSizerConfig {
        max_trade_percent: 25,
        max_slippage_bps: 50,
    });

    let action = sizer.build_action(&assessment, &balances).unwrap();
    assert_eq!(action.direction, TradeDirection::Buy);
    // 40% target capped at 25% of $5,000
    assert_eq!(action.amount, 1_250 * STABLE_UNITS_PER_TOKEN);
}

#[tokio::test]
async fn test_snapshot_file_round_trip() {
    let path = std::env::temp_dir().join(format!("cycle-advisor-it-{}.json", std::process::id()));
    let json = serde_json::json!({
        "timestamp": "2026-02-12T00:00:00Z",
        "btcPrice": 68040,
        "realizedPrice": 55548,
        "sthCostBasis": 92000,
        "sma200": 101702,
        "trueMarketMean": 79124,
        "cvddFloor": 46133,
        "terminalPrice": 290819,
        "mvrv": 1.22,
        "sthMvrv": 0.74,
        "lthMvrv": 2.1,
        "mayerMultiple": 0.67,
        "realizedPriceRatio": 1.22,
        "lthSopr": 0.82,
        "avivRatio": 0.95,
        "cvddRatio": 1.47,
        "terminalPriceRatio": 0.23
    });
    std::fs::write(&path, json.to_string()).unwrap();

    let snapshot = FileIndicatorSource::new(&path).fetch().await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(snapshot, real_snapshot());
    assert_eq!(assess(&snapshot).bottom.score, 3);
}
