//! Swap execution behind a venue boundary.
//!
//! The executor owns the safety checks (balance, price impact) and delegates
//! quoting and submission to a [`SwapVenue`].

use cycle_core::sources::Balances;
use cycle_core::types::{
    ExecutionError, TradeAction, TradeFill, NATIVE_MINT, NATIVE_UNITS_PER_TOKEN, STABLE_MINT,
    STABLE_UNITS_PER_TOKEN,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A venue quote for one swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Expected price impact, in percent.
    pub price_impact_pct: f64,
    pub slippage_bps: u16,
}

/// Quote and submit swaps on an external venue.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SwapVenue: Send + Sync {
    fn name(&self) -> &'static str;

    async fn quote(&self, action: &TradeAction) -> Result<SwapQuote, ExecutionError>;

    /// Submit a quoted swap and return the transaction id.
    async fn submit(&self, quote: &SwapQuote) -> Result<String, ExecutionError>;
}

/// Counters for executed swaps.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetrics {
    pub swaps_submitted: u64,
    pub swaps_filled: u64,
    pub swaps_rejected: u64,
}

/// Configuration for the swap executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Quotes with a larger price impact (percent) are rejected.
    pub max_price_impact_pct: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_price_impact_pct: 2.0,
        }
    }
}

/// Executes sized trades against a venue.
pub struct SwapExecutor<V> {
    venue: V,
    config: ExecutorConfig,
    metrics: RwLock<ExecutionMetrics>,
}

impl<V: SwapVenue> SwapExecutor<V> {
    pub fn new(venue: V, config: ExecutorConfig) -> Self {
        Self {
            venue,
            config,
            metrics: RwLock::new(ExecutionMetrics::default()),
        }
    }

    /// Check funds, quote, guard price impact, then submit.
    pub async fn execute(
        &self,
        action: &TradeAction,
        balances: &Balances,
    ) -> Result<TradeFill, ExecutionError> {
        info!(
            trade_id = %action.id,
            venue = self.venue.name(),
            direction = %action.direction,
            amount = action.amount,
            percent = action.percent,
            "Executing swap"
        );

        let result = self.execute_inner(action, balances).await;
        self.record(&result);

        match &result {
            Ok(fill) => info!(
                trade_id = %action.id,
                tx_id = %fill.tx_id,
                input = fill.input_amount,
                output = fill.output_amount,
                "Swap executed"
            ),
            Err(e) => warn!(trade_id = %action.id, error = %e, "Swap rejected"),
        }
        result
    }

    /// Snapshot of the execution counters.
    pub fn metrics(&self) -> ExecutionMetrics {
        self.metrics
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    async fn execute_inner(
        &self,
        action: &TradeAction,
        balances: &Balances,
    ) -> Result<TradeFill, ExecutionError> {
        let available = if action.input_mint == NATIVE_MINT {
            balances.native
        } else if action.input_mint == STABLE_MINT {
            balances.stable
        } else {
            return Err(ExecutionError::NotConfigured(format!(
                "unknown input mint {}",
                action.input_mint
            )));
        };
        if action.amount > available {
            return Err(ExecutionError::InsufficientFunds {
                needed: action.amount,
                available,
            });
        }

        let quote = self.venue.quote(action).await?;
        debug!(
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            impact = quote.price_impact_pct,
            "Received swap quote"
        );

        if quote.price_impact_pct > self.config.max_price_impact_pct {
            return Err(ExecutionError::PriceImpactTooHigh {
                impact_pct: quote.price_impact_pct,
                max_pct: self.config.max_price_impact_pct,
            });
        }

        let tx_id = self.venue.submit(&quote).await?;
        let price = quote.out_amount as f64 / quote.in_amount.max(1) as f64;

        Ok(TradeFill {
            tx_id,
            input_amount: quote.in_amount,
            output_amount: quote.out_amount,
            price,
        })
    }

    fn record(&self, result: &Result<TradeFill, ExecutionError>) {
        if let Ok(mut metrics) = self.metrics.write() {
            metrics.swaps_submitted += 1;
            if result.is_ok() {
                metrics.swaps_filled += 1;
            } else {
                metrics.swaps_rejected += 1;
            }
        }
    }
}

/// Simulated venue filling at a fixed native price with no impact.
#[derive(Debug, Clone)]
pub struct PaperVenue {
    native_price: f64,
}

impl PaperVenue {
    pub fn new(native_price: f64) -> Self {
        Self { native_price }
    }
}

#[async_trait::async_trait]
impl SwapVenue for PaperVenue {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn quote(&self, action: &TradeAction) -> Result<SwapQuote, ExecutionError> {
        if !(self.native_price.is_finite() && self.native_price > 0.0) {
            return Err(ExecutionError::NotConfigured(
                "paper venue needs a positive native price".to_string(),
            ));
        }

        let native_per_unit = NATIVE_UNITS_PER_TOKEN as f64;
        let stable_per_unit = STABLE_UNITS_PER_TOKEN as f64;
        let amount = action.amount as f64;

        let out_amount = if action.input_mint == STABLE_MINT {
            amount / stable_per_unit / self.native_price * native_per_unit
        } else {
            amount / native_per_unit * self.native_price * stable_per_unit
        };

        Ok(SwapQuote {
            input_mint: action.input_mint.clone(),
            output_mint: action.output_mint.clone(),
            in_amount: action.amount,
            out_amount: out_amount.floor() as u64,
            price_impact_pct: 0.0,
            slippage_bps: action.slippage_bps,
        })
    }

    async fn submit(&self, quote: &SwapQuote) -> Result<String, ExecutionError> {
        let tx_id = format!("paper-{}", Uuid::new_v4());
        info!(
            tx_id = %tx_id,
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            "[PAPER] Simulated swap fill"
        );
        Ok(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycle_core::types::TradeDirection;

    fn buy_action(amount: u64) -> TradeAction {
        TradeAction {
            id: Uuid::new_v4(),
            direction: TradeDirection::Buy,
            percent: 40.0,
            input_mint: STABLE_MINT.to_string(),
            output_mint: NATIVE_MINT.to_string(),
            amount,
            slippage_bps: 100,
        }
    }

    fn balances() -> Balances {
        Balances {
            native: 10 * NATIVE_UNITS_PER_TOKEN,
            stable: 1_000 * STABLE_UNITS_PER_TOKEN,
            native_price: 100.0,
        }
    }

    fn quote(impact: f64) -> SwapQuote {
        SwapQuote {
            input_mint: STABLE_MINT.to_string(),
            output_mint: NATIVE_MINT.to_string(),
            in_amount: 800_000_000,
            out_amount: 8_000_000_000,
            price_impact_pct: impact,
            slippage_bps: 100,
        }
    }

    #[tokio::test]
    async fn test_successful_swap() {
        let mut venue = MockSwapVenue::new();
        venue.expect_name().return_const("mock");
        venue.expect_quote().times(1).returning(|_| Ok(quote(0.3)));
        venue
            .expect_submit()
            .times(1)
            .returning(|_| Ok("tx-123".to_string()));

        let executor = SwapExecutor::new(venue, ExecutorConfig::default());
        let fill = executor
            .execute(&buy_action(800_000_000), &balances())
            .await
            .unwrap();

        assert_eq!(fill.tx_id, "tx-123");
        assert_eq!(fill.output_amount, 8_000_000_000);
        assert!((fill.price - 10.0).abs() < 1e-9);
        assert_eq!(executor.metrics().swaps_filled, 1);
    }

    #[tokio::test]
    async fn test_price_impact_guard() {
        let mut venue = MockSwapVenue::new();
        venue.expect_name().return_const("mock");
        venue.expect_quote().times(1).returning(|_| Ok(quote(2.5)));
        venue.expect_submit().never();

        let executor = SwapExecutor::new(venue, ExecutorConfig::default());
        let err = executor
            .execute(&buy_action(800_000_000), &balances())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::PriceImpactTooHigh { impact_pct, max_pct }
                if impact_pct == 2.5 && max_pct == 2.0
        ));
        assert_eq!(executor.metrics().swaps_rejected, 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds_skips_venue() {
        let mut venue = MockSwapVenue::new();
        venue.expect_name().return_const("mock");
        venue.expect_quote().never();

        let executor = SwapExecutor::new(venue, ExecutorConfig::default());
        let err = executor
            .execute(&buy_action(2_000 * STABLE_UNITS_PER_TOKEN), &balances())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::InsufficientFunds {
                needed: 2_000_000_000,
                available: 1_000_000_000
            }
        );
    }

    #[tokio::test]
    async fn test_venue_error_propagates() {
        let mut venue = MockSwapVenue::new();
        venue.expect_name().return_const("mock");
        venue
            .expect_quote()
            .returning(|_| Err(ExecutionError::Network("timeout".to_string())));

        let executor = SwapExecutor::new(venue, ExecutorConfig::default());
        let err = executor
            .execute(&buy_action(100_000_000), &balances())
            .await
            .unwrap_err();
        assert_eq!(err, ExecutionError::Network("timeout".to_string()));
    }

    #[test]
    fn test_paper_venue_round_trip_rates() {
        let executor = SwapExecutor::new(PaperVenue::new(100.0), ExecutorConfig::default());

        let fill = tokio_test::block_on(executor.execute(&buy_action(800_000_000), &balances()))
            .unwrap();
        // $800 buys 8 tokens at $100
        assert_eq!(fill.output_amount, 8 * NATIVE_UNITS_PER_TOKEN);
        assert!(fill.tx_id.starts_with("paper-"));

        let sell = TradeAction {
            direction: TradeDirection::Sell,
            input_mint: NATIVE_MINT.to_string(),
            output_mint: STABLE_MINT.to_string(),
            amount: 5 * NATIVE_UNITS_PER_TOKEN,
            ..buy_action(0)
        };
        let fill = tokio_test::block_on(executor.execute(&sell, &balances())).unwrap();
        assert_eq!(fill.output_amount, 500 * STABLE_UNITS_PER_TOKEN);
    }

    #[test]
    fn test_paper_venue_requires_price() {
        let executor = SwapExecutor::new(PaperVenue::new(0.0), ExecutorConfig::default());
        let err = tokio_test::block_on(executor.execute(&buy_action(1_000_000), &balances()))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotConfigured(_)));
    }
}
