//! Cycle Core - shared types and collaborators for the cycle advisor.
//!
//! This crate provides:
//! - Indicator snapshot, signal, lending and trade types
//! - Environment and analysis-table configuration
//! - File-backed data sources behind async collaborator traits
//! - Error types

pub mod config;
pub mod error;
pub mod sources;
pub mod types;

pub use error::{Error, Result};
