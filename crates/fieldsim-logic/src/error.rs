//! Error types for simulation operations.
//!
//! Every variant is a programmer or configuration error. None of them is
//! retried or recovered from inside the core; they surface to the driver.

use thiserror::Error;

use crate::vector::Vec3;

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A delay queue received a timestamp older than one it already holds.
    #[error("time {time} is earlier than latest queued time {latest}")]
    TimeWentBackwards { time: f64, latest: f64 },

    /// A throughput-limited queue was polled before its last release.
    #[error("as_of {as_of} is earlier than last release {last_release}")]
    ReleaseBeforeLastRelease { as_of: f64, last_release: f64 },

    /// Placement or move outside a non-toroidal space.
    #[error("point {0:?} out of bounds, and space non-toroidal")]
    OutOfBounds(Vec3),

    /// Removal or move of a key the spatial index does not hold.
    #[error("body is not placed in the space")]
    NotPlaced,

    /// A key was placed twice.
    #[error("body is already placed in the space")]
    AlreadyPlaced,

    /// Nearest-surface projection requested for a point on the bucket axis.
    #[error("point {0:?} lies on the bucket axis")]
    OnAxis(Vec3),

    /// Bucket dimensions that cannot form an upward-opening frustum.
    #[error("invalid bucket: {reason}")]
    InvalidBucket { reason: String },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The spatial index disagrees with the world about where bodies are.
    #[error("index out of sync: {reason}")]
    IndexDesync { reason: String },

    /// Arena operation on an entity that no longer exists.
    #[error("unknown entity")]
    UnknownEntity,
}

/// Result alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn invalid_bucket(reason: impl Into<String>) -> Self {
        Self::InvalidBucket {
            reason: reason.into(),
        }
    }
}
