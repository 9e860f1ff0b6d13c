//! Error types for message-bus operations.

use crate::offset::OffsetBoundary;
use thiserror::Error;

/// Result type for message-bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors raised by a connection provider, a session factory or a consumer
/// session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// The cluster could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The topic or partition does not exist on the cluster.
    #[error("unknown topic or partition: {topic}/{partition}")]
    UnknownTopicOrPartition {
        /// Topic name.
        topic: String,
        /// Partition id.
        partition: u32,
    },

    /// A boundary offset lookup failed.
    #[error("offset lookup failed for {topic}/{partition} ({boundary}): {message}")]
    OffsetLookup {
        /// Topic name.
        topic: String,
        /// Partition id.
        partition: u32,
        /// The boundary that was requested.
        boundary: OffsetBoundary,
        /// Description of the failure.
        message: String,
    },

    /// A subscription could not be established.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// A session failed while shutting down.
    #[error("close failed: {0}")]
    Close(String),

    /// The session reported an out-of-band stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// A bus snapshot could not be loaded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl BusError {
    /// Returns true if the error means the cluster connection is unusable.
    pub fn is_connection(&self) -> bool {
        matches!(self, BusError::Connection(_))
    }
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::Snapshot(err.to_string())
    }
}

impl From<std::io::Error> for BusError {
    fn from(err: std::io::Error) -> Self {
        BusError::Snapshot(err.to_string())
    }
}
