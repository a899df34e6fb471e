// packages/engine/src/utils/errors.rs
//! Error taxonomy for the simulator
//!
//! Every failure is fatal to the actor that observes it, except
//! [`SimError::ChannelClosed`], which airport actors treat as an orderly stop.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SimError>;

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimError {
    /// The shared channel could not be created, resolved or attached
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// The shared channel was torn down while an actor was using it
    #[error("channel closed")]
    ChannelClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Operator input out of bounds
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Runway capacity rejected while building a pool
    #[error("resource initialisation failed: {0}")]
    ResourceInitFailed(String),

    #[error("no available resource: {0}")]
    NoAvailableResource(String),

    /// Malformed wire record
    #[error("codec error: {0}")]
    Codec(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A spawned actor or allocation task panicked or was cancelled
    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// True when the error only reports that the channel went away
    pub fn is_closed(&self) -> bool {
        matches!(self, SimError::ChannelClosed)
    }
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::ConfigError(err.to_string())
    }
}
