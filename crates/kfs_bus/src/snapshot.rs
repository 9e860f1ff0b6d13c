//! Serializable description of a bus's topics and retained messages.

use crate::error::BusResult;
use crate::offset::Offset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of an in-memory bus.
///
/// ```json
/// {
///   "topics": [
///     { "name": "orders", "partitions": [ { "base_offset": 10, "messages": ["a", "bb"] } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSnapshot {
    /// Topics in name order.
    #[serde(default)]
    pub topics: Vec<TopicSnapshot>,
}

/// One topic of a [`BusSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    /// Topic name.
    pub name: String,
    /// Partitions, indexed by partition id.
    #[serde(default)]
    pub partitions: Vec<PartitionSnapshot>,
}

/// One partition of a [`TopicSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSnapshot {
    /// Offset of the first retained message.
    #[serde(default)]
    pub base_offset: Offset,
    /// Retained message values, oldest first.
    #[serde(default)]
    pub messages: Vec<String>,
}

impl BusSnapshot {
    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Snapshot`](crate::BusError::Snapshot) if the text is
    /// not a valid snapshot.
    pub fn from_json(text: &str) -> BusResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Snapshot`](crate::BusError::Snapshot) if the file
    /// cannot be read or parsed.
    pub fn load(path: &Path) -> BusResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Renders the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> BusResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
