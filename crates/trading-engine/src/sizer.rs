//! Converts a risk assessment into a bounded rebalancing trade.

use cycle_core::config::AgentConfig;
use cycle_core::sources::Balances;
use cycle_core::types::{
    TradeAction, TradeDirection, NATIVE_MINT, NATIVE_UNITS_PER_TOKEN, STABLE_MINT,
    STABLE_UNITS_PER_TOKEN,
};
use risk_manager::RiskAssessment;
use rust_decimal::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

/// Allocation drift (percentage points) below which no trade is made.
pub const DEAD_BAND_PERCENT: u32 = 5;
/// Smallest stable spend worth submitting (0.1 stable token).
pub const MIN_STABLE_TRADE_UNITS: u64 = 100_000;
/// Smallest native sale worth submitting (0.001 token).
pub const MIN_NATIVE_TRADE_UNITS: u64 = 1_000_000;
/// Native units kept back for network fees when selling (0.05 token).
pub const NATIVE_FEE_RESERVE_UNITS: u64 = 50_000_000;

/// Limits applied to every sized trade.
#[derive(Debug, Clone)]
pub struct TradeSizerConfig {
    /// Largest allocation change per trade, in percent (1..=100).
    pub max_trade_percent: u8,
    /// Slippage tolerance passed through to the venue.
    pub max_slippage_bps: u16,
}

impl Default for TradeSizerConfig {
    fn default() -> Self {
        Self {
            max_trade_percent: 100,
            max_slippage_bps: 100,
        }
    }
}

impl From<&AgentConfig> for TradeSizerConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_trade_percent: config.max_trade_percent,
            max_slippage_bps: config.max_slippage_bps,
        }
    }
}

/// Sizes rebalancing trades towards the assessed exposure target.
#[derive(Debug, Clone, Default)]
pub struct TradeSizer {
    config: TradeSizerConfig,
}

impl TradeSizer {
    pub fn new(config: TradeSizerConfig) -> Self {
        Self { config }
    }

    /// Build a trade, or `None` when the rules say not to trade.
    ///
    /// Skips are logged with their reason. They are not errors.
    pub fn build_action(
        &self,
        assessment: &RiskAssessment,
        balances: &Balances,
    ) -> Option<TradeAction> {
        let direction = assessment.suggested_action;
        if direction == TradeDirection::Hold {
            info!("No trade needed - HOLD signal");
            return None;
        }

        let price = match Decimal::from_f64(balances.native_price) {
            Some(p) if p > Decimal::ZERO => p,
            _ => {
                warn!(price = balances.native_price, "Invalid native price, skipping trade");
                return None;
            }
        };

        let Some((native_usd, total_usd)) = portfolio_usd(balances, price) else {
            warn!(
                native = balances.native,
                stable = balances.stable,
                price = balances.native_price,
                "Portfolio value out of range, skipping trade"
            );
            return None;
        };

        if total_usd < Decimal::ONE {
            warn!(total_usd = %total_usd, "Portfolio value too low to trade");
            return None;
        }

        let hundred = Decimal::ONE_HUNDRED;
        let current_pct = native_usd / total_usd * hundred;
        let delta = Decimal::from(assessment.exposure_percent) - current_pct;

        if delta.abs() < Decimal::from(DEAD_BAND_PERCENT) {
            info!(delta = %delta.round_dp(1), "Delta too small, no trade needed");
            return None;
        }

        // Skip instead of trading against the signal when the allocation
        // already overshoots the target on the other side.
        let wrong_side = match direction {
            TradeDirection::Buy => delta.is_sign_negative(),
            TradeDirection::Sell => delta.is_sign_positive(),
            TradeDirection::Hold => false,
        };
        if wrong_side {
            info!(
                action = %direction,
                current = %current_pct.round_dp(1),
                target = assessment.exposure_percent,
                "Allocation already past target for this action, no trade needed"
            );
            return None;
        }

        let capped = delta.abs().min(Decimal::from(self.config.max_trade_percent));
        let trade_usd = capped / hundred * total_usd;

        let (input_mint, output_mint, amount) = match direction {
            TradeDirection::Buy => {
                let Some(wanted) = trade_usd.checked_mul(Decimal::from(STABLE_UNITS_PER_TOKEN))
                else {
                    warn!(trade_usd = %trade_usd, "Trade size out of range, skipping trade");
                    return None;
                };
                let wanted = wanted.floor().to_u64().unwrap_or(u64::MAX);
                let amount = wanted.min(balances.stable);
                if amount < MIN_STABLE_TRADE_UNITS {
                    warn!(amount, "Insufficient stable balance to buy");
                    return None;
                }
                (STABLE_MINT, NATIVE_MINT, amount)
            }
            TradeDirection::Sell => {
                let Some(wanted) = trade_usd
                    .checked_div(price)
                    .and_then(|tokens| tokens.checked_mul(Decimal::from(NATIVE_UNITS_PER_TOKEN)))
                else {
                    warn!(trade_usd = %trade_usd, "Trade size out of range, skipping trade");
                    return None;
                };
                let wanted = wanted.floor().to_u64().unwrap_or(u64::MAX);
                let available = balances.native.saturating_sub(NATIVE_FEE_RESERVE_UNITS);
                let amount = wanted.min(available);
                if amount < MIN_NATIVE_TRADE_UNITS {
                    warn!(amount, "Insufficient native balance to sell");
                    return None;
                }
                (NATIVE_MINT, STABLE_MINT, amount)
            }
            TradeDirection::Hold => return None,
        };

        let percent = capped.to_f64().unwrap_or_default();
        info!(
            action = %direction,
            amount,
            percent = %capped.round_dp(1),
            "Trade sized"
        );

        Some(TradeAction {
            id: Uuid::new_v4(),
            direction,
            percent,
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps: self.config.max_slippage_bps,
        })
    }
}

/// Risk asset value and total portfolio value in stable terms.
fn portfolio_usd(balances: &Balances, price: Decimal) -> Option<(Decimal, Decimal)> {
    let native_usd = (Decimal::from(balances.native) / Decimal::from(NATIVE_UNITS_PER_TOKEN))
        .checked_mul(price)?;
    let stable_usd = Decimal::from(balances.stable) / Decimal::from(STABLE_UNITS_PER_TOKEN);
    Some((native_usd, native_usd.checked_add(stable_usd)?))
}
