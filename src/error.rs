//! Error types for the carelog analytics engine

use thiserror::Error;

/// Errors that can occur while building analytics
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Log repository unavailable: {0}")]
    Repository(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
