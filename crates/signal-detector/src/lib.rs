//! Signal Detector - cycle bottom and top classification.
//!
//! This crate provides:
//! - Three-tier threshold classification in both directions
//! - The 8-metric bottom detector and 6-metric top detector
//! - A rule table for convergence facts over active signals

pub mod bottom;
pub mod convergence;
pub mod tiers;
pub mod top;

pub use bottom::BottomDetector;
pub use convergence::{evaluate_convergences, CONFLUENCE_MIN_SIGNALS};
pub use tiers::{classify_bottom, classify_top, describe_bottom_thresholds, describe_top_thresholds};
pub use top::TopDetector;
