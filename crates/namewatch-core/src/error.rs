//! Error types for the namewatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for namewatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the namewatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Availability probe errors (transport, status, body)
    #[error("Probe error ({probe}): {message}")]
    Probe {
        /// Probe name
        probe: String,
        /// Error message
        message: String,
    },

    /// Notifier errors (webhook delivery)
    #[error("Notifier error ({notifier}): {message}")]
    Notifier {
        /// Notifier name
        notifier: String,
        /// Error message
        message: String,
    },

    /// Availability log errors
    #[error("Availability log error: {0}")]
    AvailabilityLog(String),

    /// Identifier source errors
    #[error("Identifier source error: {0}")]
    Source(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit retries exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Identifier not tracked by the store
    #[error("Identifier not found: {0}")]
    NotFound(String),

    /// Stop signal observed at a blocking point
    #[error("Cancelled by shutdown signal")]
    Cancelled,

    /// A collaborator panicked mid-cycle
    #[error("Cycle panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Create a probe error
    pub fn probe(probe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            probe: probe.into(),
            message: message.into(),
        }
    }

    /// Create a notifier error
    pub fn notifier(notifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notifier {
            notifier: notifier.into(),
            message: message.into(),
        }
    }

    /// Create an availability log error
    pub fn availability_log(msg: impl Into<String>) -> Self {
        Self::AvailabilityLog(msg.into())
    }

    /// Create an identifier source error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a panic error from a caught unwind payload
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_string());
        Self::Panicked(message)
    }

    /// Whether this error is the shutdown signal rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
