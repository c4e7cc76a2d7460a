//! Error types for the discovery system.

use thiserror::Error;

/// Error type for discovery operations.
///
/// Only local failures surface here. Replies that do not belong to a probe or
/// cannot be parsed are dropped inside the probe task and never become errors.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket creation, bind, send or a read failure other than the deadline
    #[error("Network error: {0}")]
    Network(String),

    /// Interface enumeration failed
    #[error("Failed to list network interfaces: {0}")]
    Interfaces(String),

    /// A probe task panicked before reporting
    #[error("Probe task on {0} did not complete")]
    TaskFailed(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
