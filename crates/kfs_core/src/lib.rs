//! # kfs core
//!
//! Exposes topic partitions of a publish/subscribe message log as read-only
//! files.
//!
//! This crate provides:
//! - [`PartitionFile`] - the per-partition adapter a filesystem host drives
//! - [`ReadAccumulator`] - the bounded-wait drain shared by every read
//! - [`FileAttributes`] with an explicit estimated/measured [`FileSize`]
//! - [`FileNode`] - the kernel file-interface contract
//!
//! ## Key Invariants
//!
//! - Every open replays the partition from its oldest retained offset
//! - A read never blocks longer than one idle timeout after the last message
//! - A windowed read never writes past the requested size
//! - Writes are always rejected
//!
//! ## Example
//!
//! ```rust
//! use kfs_bus::InMemoryBus;
//! use kfs_core::{FileConfig, FileNode, PartitionFile, PartitionHandle};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let bus = Arc::new(InMemoryBus::new());
//! bus.create_topic("orders", 1);
//! bus.produce("orders", 0, "a").unwrap();
//!
//! let config = FileConfig::new().idle_timeout(Duration::from_millis(50));
//! let file = PartitionFile::with_bus(PartitionHandle::new("orders", 0), bus, config);
//! assert_eq!(file.attributes().unwrap().size(), 1);
//!
//! file.open().unwrap();
//! assert_eq!(file.read_all().unwrap(), b"a\n");
//! file.release().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accumulator;
mod attr;
mod config;
mod error;
mod file;
mod handle;
mod node;
mod stats;

pub use accumulator::{Drain, ReadAccumulator, StopReason};
pub use attr::{FileAttributes, FileKind, FileSize};
pub use config::{FileConfig, DEFAULT_IDLE_TIMEOUT};
pub use error::{FsError, FsResult};
pub use file::{FileState, PartitionFile};
pub use handle::PartitionHandle;
pub use node::{FileNode, OpenReply};
pub use stats::{FileStats, StatsSnapshot};
