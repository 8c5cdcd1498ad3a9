//! Error types for dnssync
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for dnssync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnssync
#[derive(Error, Debug)]
pub enum Error {
    /// Text could not be parsed (time, record type, record line, record data)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Zone is not served by the provider
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Record is not present in the provider's zone
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Write attempted on a read-only provider
    #[error("Provider {0} is read-only")]
    ReadOnly(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (zone files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific operation failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound(zone.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(msg: impl Into<String>) -> Self {
        Self::RecordNotFound(msg.into())
    }

    /// Create a read-only error for the given provider id
    pub fn read_only(provider: impl Into<String>) -> Self {
        Self::ReadOnly(provider.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for malformed-text errors, which callers may choose to skip
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
