//! Trade instruction and execution result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Mint of the risk asset (wrapped SOL).
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";
/// Mint of the stable asset (USDC).
pub const STABLE_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Smallest units per whole risk-asset token (lamports per SOL).
pub const NATIVE_UNITS_PER_TOKEN: u64 = 1_000_000_000;
/// Smallest units per whole stable token.
pub const STABLE_UNITS_PER_TOKEN: u64 = 1_000_000;

/// Suggested action on the risk asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeDirection::Buy => "BUY",
            TradeDirection::Sell => "SELL",
            TradeDirection::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A bounded swap instruction for the execution collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub id: Uuid,
    pub direction: TradeDirection,
    /// Percent of the portfolio being moved.
    pub percent: f64,
    pub input_mint: String,
    pub output_mint: String,
    /// Amount of the input asset in smallest units.
    pub amount: u64,
    pub slippage_bps: u16,
}

/// Realized outcome of a successful swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    pub tx_id: String,
    pub input_amount: u64,
    pub output_amount: u64,
    /// Output units received per input unit.
    pub price: f64,
}

/// Typed failure reasons from the execution collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Price impact too high: {impact_pct}% (max {max_pct}%)")]
    PriceImpactTooHigh { impact_pct: f64, max_pct: f64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Execution not configured: {0}")]
    NotConfigured(String),
}
