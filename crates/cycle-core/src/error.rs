//! Error types for the cycle advisor.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required indicator: {field}")]
    MissingIndicator { field: &'static str },

    #[error("Invalid indicator value for {field}: {reason}")]
    InvalidIndicator { field: &'static str, reason: String },

    #[error("Price must be > 0 but got {0}")]
    NonPositivePrice(f64),

    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
