//! Partition offsets and start positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bus-native message position within one partition.
pub type Offset = i64;

/// One end of the range of offsets a partition currently retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetBoundary {
    /// The oldest retained message.
    Oldest,
    /// The position the next produced message will take.
    Newest,
}

impl fmt::Display for OffsetBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetBoundary::Oldest => f.write_str("oldest"),
            OffsetBoundary::Newest => f.write_str("newest"),
        }
    }
}

/// Where a new consumer session begins reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartOffset {
    /// Replay the full retained history.
    Oldest,
    /// Only messages produced after the subscription.
    Newest,
    /// An explicit offset.
    At(Offset),
}

impl From<OffsetBoundary> for StartOffset {
    fn from(boundary: OffsetBoundary) -> Self {
        match boundary {
            OffsetBoundary::Oldest => StartOffset::Oldest,
            OffsetBoundary::Newest => StartOffset::Newest,
        }
    }
}

impl fmt::Display for StartOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOffset::Oldest => f.write_str("oldest"),
            StartOffset::Newest => f.write_str("newest"),
            StartOffset::At(offset) => write!(f, "{offset}"),
        }
    }
}
