//! Error types for the Ratewarden service.

use thiserror::Error;

/// Main error type for Ratewarden operations.
///
/// The rate limiter itself is infallible; these errors come from the
/// surrounding service (configuration loading and the HTTP listener).
#[derive(Error, Debug)]
pub enum RateWardenError {
    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised while reading layered configuration sources
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Ratewarden operations.
pub type Result<T> = std::result::Result<T, RateWardenError>;
