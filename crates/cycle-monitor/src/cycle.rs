//! One analysis cycle: load, score, assess, advise and optionally trade.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cycle_core::config::AnalysisConfig;
use cycle_core::sources::{BalanceSource, IndicatorSource, LendingSource};
use cycle_core::types::{Freshness, IndicatorSnapshot, TradeAction, TradeFill};
use risk_manager::{LoanAdvisor, LoanWarning, RiskAssessment, RiskEngine};
use serde::Serialize;
use signal_detector::{BottomDetector, TopDetector};
use tracing::{info, warn};
use trading_engine::{PaperVenue, SwapExecutor, TradeSizer};

use crate::alert::Alert;

/// Result of a sized and submitted trade.
#[derive(Debug, Clone, Serialize)]
pub struct TradeOutcome {
    pub action: TradeAction,
    pub fill: Option<TradeFill>,
    pub error: Option<String>,
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub generated_at: DateTime<Utc>,
    pub snapshot: IndicatorSnapshot,
    /// Hours since the snapshot timestamp, if it had one.
    pub data_age_hours: Option<f64>,
    pub stale: bool,
    pub assessment: RiskAssessment,
    pub loan_warnings: Vec<LoanWarning>,
    /// The lending source failed, so no position was checked.
    pub positions_unavailable: bool,
    pub alert: Alert,
    pub trade: Option<TradeOutcome>,
}

/// Balance source, sizer and executor used in auto mode.
pub struct AutoTrading {
    balances: Box<dyn BalanceSource>,
    sizer: TradeSizer,
    executor: SwapExecutor<PaperVenue>,
}

impl AutoTrading {
    pub fn new(
        balances: Box<dyn BalanceSource>,
        sizer: TradeSizer,
        executor: SwapExecutor<PaperVenue>,
    ) -> Self {
        Self {
            balances,
            sizer,
            executor,
        }
    }

    async fn run(&self, assessment: &RiskAssessment) -> Option<TradeOutcome> {
        let balances = match self.balances.balances().await {
            Ok(balances) => balances,
            Err(e) => {
                warn!(error = %e, "Could not read balances, skipping trade");
                return None;
            }
        };

        let action = self.sizer.build_action(assessment, &balances)?;
        match self.executor.execute(&action, &balances).await {
            Ok(fill) => Some(TradeOutcome {
                action,
                fill: Some(fill),
                error: None,
            }),
            Err(e) => Some(TradeOutcome {
                action,
                fill: None,
                error: Some(e.to_string()),
            }),
        }
    }
}

/// Runs analysis cycles against a fixed set of collaborators.
pub struct CycleRunner {
    indicators: Box<dyn IndicatorSource>,
    lending: Box<dyn LendingSource>,
    bottom: BottomDetector,
    top: TopDetector,
    engine: RiskEngine,
    advisor: LoanAdvisor,
    trading: Option<AutoTrading>,
}

impl CycleRunner {
    pub fn new(
        analysis: &AnalysisConfig,
        indicators: Box<dyn IndicatorSource>,
        lending: Box<dyn LendingSource>,
    ) -> Self {
        Self {
            indicators,
            lending,
            bottom: BottomDetector::new(analysis.bottom_thresholds.clone()),
            top: TopDetector::new(analysis.top_thresholds.clone()),
            engine: RiskEngine::from_config(analysis),
            advisor: LoanAdvisor::from_config(analysis),
            trading: None,
        }
    }

    pub fn with_trading(mut self, trading: AutoTrading) -> Self {
        self.trading = Some(trading);
        self
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<CycleOutcome> {
        let snapshot = self
            .indicators
            .fetch()
            .await
            .with_context(|| format!("Failed to load indicators from {}", self.indicators.name()))?;

        let freshness = snapshot.freshness(now);
        let data_age_hours = match freshness {
            Freshness::Fresh { age_hours } => Some(age_hours),
            Freshness::Stale { age_hours } => {
                warn!(age_hours = age_hours.round(), "Indicator data is stale");
                Some(age_hours)
            }
            Freshness::Unknown => {
                warn!("Indicator data has no usable timestamp, cannot check freshness");
                None
            }
        };

        let bottom = self.bottom.detect(&snapshot);
        let top = self.top.detect(&snapshot);
        let assessment = self.engine.assess(&snapshot, bottom, top);

        let (positions, positions_unavailable) = match self.lending.positions().await {
            Ok(positions) => (positions, false),
            Err(e) => {
                warn!(error = %e, "Could not load lending positions, continuing without them");
                (Vec::new(), true)
            }
        };
        let loan_warnings = self.advisor.assess(&assessment, &positions);

        let alert = Alert::from_assessment(&assessment, now);
        info!(
            signal = %alert.signal,
            severity = %alert.severity,
            warnings = loan_warnings.len(),
            "Cycle complete"
        );

        let trade = match &self.trading {
            Some(trading) => trading.run(&assessment).await,
            None => None,
        };

        Ok(CycleOutcome {
            generated_at: now,
            stale: freshness.is_stale(),
            snapshot,
            data_age_hours,
            assessment,
            loan_warnings,
            positions_unavailable,
            alert,
            trade,
        })
    }
}
