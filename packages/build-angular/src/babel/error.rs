//! Transform Configuration Errors

use thiserror::Error;

use super::capabilities::CapabilityError;

/// An error that aborts option resolution for a single file.
#[derive(Debug, Error)]
pub enum TransformConfigError {
    /// A required capability could not be loaded.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Caller options were not valid JSON or had the wrong shape.
    #[error("invalid transform options: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    /// Resolved options or the cache identifier could not be serialized.
    #[error("failed to serialize transform options: {0}")]
    Serialize(#[source] serde_json::Error),
}
