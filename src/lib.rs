//! Cycle Advisor: BTC on-chain cycle scoring for exposure and leverage decisions
//!
//! This is the root crate that gives benchmarks and integration tests access
//! to the member crates. For actual functionality, use them directly:
//!
//! - `cycle-core`: Snapshot types, validation, configuration, data sources
//! - `signal-detector`: Bottom and top classifiers, convergence rules
//! - `risk-manager`: Risk level, exposure targets, price triggers, loan advice
//! - `trading-engine`: Trade sizing and the swap execution boundary
//! - `cycle-monitor`: The scheduled monitor binary

pub use cycle_core as core;
pub use risk_manager as risk;
pub use signal_detector as signals;
pub use trading_engine as trading;
