//! Trading Engine
//!
//! Rebalancing trade sizing and swap execution for the cycle advisor.

pub mod executor;
pub mod sizer;

pub use executor::{ExecutorConfig, PaperVenue, SwapExecutor, SwapQuote, SwapVenue};
pub use sizer::{TradeSizer, TradeSizerConfig};
