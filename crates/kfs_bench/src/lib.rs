//! Benchmark support for kfs.

pub mod utils;
