//! Error types for partition file operations.

use crate::handle::PartitionHandle;
use kfs_bus::BusError;
use thiserror::Error;

/// Result type for partition file operations.
pub type FsResult<T> = Result<T, FsError>;

const EPERM: i32 = 1;
const ENOENT: i32 = 2;
const EIO: i32 = 5;
const EBADF: i32 = 9;
const ENOTCONN: i32 = 107;

/// Errors surfaced at the kernel file-interface boundary.
///
/// An idle timeout during a read is not an error; reads return whatever has
/// accumulated instead.
#[derive(Debug, Error)]
pub enum FsError {
    /// The cluster could not be reached.
    #[error("connection error: {0}")]
    Connection(#[source] BusError),

    /// A boundary offset lookup failed.
    #[error("offset lookup failed: {0}")]
    OffsetLookup(#[source] BusError),

    /// The consumer session could not be established.
    #[error("subscribe failed: {0}")]
    Subscribe(#[source] BusError),

    /// The consumer session failed while closing. The file is closed anyway.
    #[error("close failed: {0}")]
    Close(#[source] BusError),

    /// The consumer session reported an error while being drained.
    #[error("stream error: {0}")]
    Stream(#[source] BusError),

    /// A read arrived for a file with no open session.
    #[error("partition {0} is not open")]
    NotOpen(PartitionHandle),

    /// Partition files are read-only.
    #[error("permission denied: partition files are read-only")]
    PermissionDenied,
}

impl FsError {
    /// Classifies an error from a boundary offset lookup.
    pub(crate) fn offset_lookup(err: BusError) -> Self {
        if err.is_connection() {
            FsError::Connection(err)
        } else {
            FsError::OffsetLookup(err)
        }
    }

    /// Classifies an error from a subscription attempt.
    pub(crate) fn subscribe(err: BusError) -> Self {
        if err.is_connection() {
            FsError::Connection(err)
        } else {
            FsError::Subscribe(err)
        }
    }

    /// Returns the POSIX error number a filesystem host should report.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::Connection(_) => ENOTCONN,
            FsError::OffsetLookup(BusError::UnknownTopicOrPartition { .. }) => ENOENT,
            FsError::OffsetLookup(_)
            | FsError::Subscribe(_)
            | FsError::Close(_)
            | FsError::Stream(_) => EIO,
            FsError::NotOpen(_) => EBADF,
            FsError::PermissionDenied => EPERM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(FsError::PermissionDenied.errno(), EPERM);
        assert_eq!(
            FsError::Connection(BusError::Connection("down".into())).errno(),
            ENOTCONN
        );
        assert_eq!(
            FsError::NotOpen(PartitionHandle::new("t", 0)).errno(),
            EBADF
        );
        assert_eq!(
            FsError::OffsetLookup(BusError::UnknownTopicOrPartition {
                topic: "t".into(),
                partition: 4,
            })
            .errno(),
            ENOENT
        );
        assert_eq!(FsError::Stream(BusError::Stream("x".into())).errno(), EIO);
    }

    #[test]
    fn connection_failures_are_classified() {
        let err = FsError::offset_lookup(BusError::Connection("down".into()));
        assert!(matches!(err, FsError::Connection(_)));

        let err = FsError::subscribe(BusError::Subscribe("no slots".into()));
        assert!(matches!(err, FsError::Subscribe(_)));
    }

    #[test]
    fn error_display() {
        let err = FsError::NotOpen(PartitionHandle::new("orders", 2));
        assert_eq!(err.to_string(), "partition orders/2 is not open");
    }
}
