//! File attributes reported for a partition.

use crate::config::FileConfig;
use kfs_bus::Offset;
use std::time::SystemTime;

/// Kind of filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file.
    RegularFile,
}

/// Where a partition file's size comes from.
///
/// A partition has no fixed byte length. Before a session is drained, the only
/// thing known is how many messages the partition retains, which is reported
/// as an upper-bound estimate. Once bytes are drained, the measured count
/// replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    /// Nothing has been resolved yet.
    Unknown,
    /// Message count between the boundary offsets, used as a byte-count proxy.
    Estimated {
        /// Oldest retained offset.
        oldest: Offset,
        /// Next offset to be produced.
        newest: Offset,
    },
    /// Bytes actually drained from the open session.
    Measured(u64),
}

impl FileSize {
    /// Size reported to the kernel, in bytes.
    pub fn bytes(&self) -> u64 {
        match *self {
            FileSize::Unknown => 0,
            FileSize::Estimated { oldest, newest } => newest.saturating_sub(oldest).max(0) as u64,
            FileSize::Measured(bytes) => bytes,
        }
    }

    /// Returns true if the size is an estimate rather than a measurement.
    pub fn is_estimate(&self) -> bool {
        !matches!(self, FileSize::Measured(_))
    }

    /// Adds drained bytes, switching an estimate over to a measurement.
    pub(crate) fn add_measured(&mut self, bytes: u64) {
        *self = match *self {
            FileSize::Measured(current) => FileSize::Measured(current + bytes),
            _ => FileSize::Measured(bytes),
        };
    }
}

/// POSIX-style attributes of a partition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    /// Current size and its source.
    pub size: FileSize,
    /// Object kind.
    pub kind: FileKind,
    /// Permission bits.
    pub permissions: u16,
    /// Hard link count.
    pub nlink: u32,
    /// Owner.
    pub uid: u32,
    /// Group.
    pub gid: u32,
    /// Preferred I/O block size.
    pub block_size: u32,
    /// Last time the attributes were refreshed.
    pub mtime: SystemTime,
}

impl FileAttributes {
    /// Creates attributes with an unknown size.
    pub fn new(config: &FileConfig) -> Self {
        Self {
            size: FileSize::Unknown,
            kind: FileKind::RegularFile,
            permissions: config.permissions,
            nlink: 1,
            uid: config.uid,
            gid: config.gid,
            block_size: config.block_size,
            mtime: SystemTime::now(),
        }
    }

    /// Size reported to the kernel, in bytes.
    pub fn size(&self) -> u64 {
        self.size.bytes()
    }

    /// Number of 512-byte blocks covering the size.
    pub fn blocks(&self) -> u64 {
        self.size().div_ceil(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimated_size_is_offset_span() {
        let size = FileSize::Estimated {
            oldest: 10,
            newest: 25,
        };
        assert_eq!(size.bytes(), 15);
        assert!(size.is_estimate());
    }

    #[test]
    fn inverted_offsets_report_zero() {
        let size = FileSize::Estimated {
            oldest: 30,
            newest: 25,
        };
        assert_eq!(size.bytes(), 0);
    }

    #[test]
    fn measurement_replaces_estimate() {
        let mut size = FileSize::Estimated {
            oldest: 0,
            newest: 100,
        };
        size.add_measured(9);
        assert_eq!(size, FileSize::Measured(9));
        size.add_measured(3);
        assert_eq!(size.bytes(), 12);
        assert!(!size.is_estimate());
    }

    #[test]
    fn attributes_from_config() {
        let config = FileConfig::new().owner(1000, 1000).permissions(0o400);
        let mut attrs = FileAttributes::new(&config);
        assert_eq!(attrs.kind, FileKind::RegularFile);
        assert_eq!(attrs.permissions, 0o400);
        assert_eq!(attrs.uid, 1000);
        assert_eq!(attrs.size(), 0);

        attrs.size = FileSize::Measured(513);
        assert_eq!(attrs.blocks(), 2);
    }
}
