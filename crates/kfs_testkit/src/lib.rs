//! # kfs testkit
//!
//! Test utilities for kfs.
//!
//! This crate provides:
//! - Fixtures: seeded in-memory buses and ready-made partition files
//! - Scripted sessions and fixed-offset providers for deterministic tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kfs_testkit::prelude::*;
//!
//! #[test]
//! fn reads_everything() {
//!     with_open_file(&["a", "bb"], |file| {
//!         assert_eq!(file.read_all().unwrap(), b"a\nbb\n");
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scripted;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scripted::*;
    pub use kfs_core::FileNode;
}

pub use fixtures::*;
pub use generators::*;
pub use scripted::*;
