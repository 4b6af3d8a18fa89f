//! Error types for goodhours
//!
//! The window algorithms themselves are total; errors only arise at the edges
//! (payload adapters, settings, store serialization).

use thiserror::Error;

/// Errors that can occur while preparing input for, or persisting output of, the core
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Failed to parse forecast payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid settings TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid comfort policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid work hours: {0}")]
    InvalidWorkHours(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
