//! Connection provider and session factory traits.
//!
//! Both are owned by the directory-level component that holds the cluster
//! connection. Partition files only consume them.

use crate::error::BusResult;
use crate::offset::{Offset, OffsetBoundary, StartOffset};
use crate::session::ConsumerSession;
use std::sync::Arc;

/// Access to the cluster connection and its offset metadata.
///
/// Timeout and retry policy for the round-trips behind these calls belongs to
/// the implementor.
pub trait ConnectionProvider: Send + Sync {
    /// Reconnects to the cluster if the current connection is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connection`](crate::BusError::Connection) if the
    /// cluster cannot be reached.
    fn ensure_connected(&self) -> BusResult<()>;

    /// Resolves the oldest or newest offset of a partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is unknown or the lookup failed.
    fn resolve_offset(
        &self,
        topic: &str,
        partition: u32,
        boundary: OffsetBoundary,
    ) -> BusResult<Offset>;
}

/// Creates consumer sessions bound to one partition.
pub trait SessionFactory: Send + Sync {
    /// Subscribes to `topic`/`partition` starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Subscribe`](crate::BusError::Subscribe) if the
    /// subscription cannot be established.
    fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartOffset,
    ) -> BusResult<Arc<dyn ConsumerSession>>;
}
