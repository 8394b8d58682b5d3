//! Core domain types for the cycle advisor.

pub mod indicators;
pub mod lending;
pub mod signal;
pub mod trade;

pub use indicators::*;
pub use lending::*;
pub use signal::*;
pub use trade::*;
