//! Partition identity.

use std::fmt;

/// Identifies the partition a file exposes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionHandle {
    topic: String,
    partition: u32,
}

impl PartitionHandle {
    /// Creates a handle for `topic`/`partition`.
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }

    /// Topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition id.
    pub fn partition(&self) -> u32 {
        self.partition
    }
}

impl fmt::Display for PartitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_accessors() {
        let handle = PartitionHandle::new("orders", 7);
        assert_eq!(handle.topic(), "orders");
        assert_eq!(handle.partition(), 7);
        assert_eq!(handle.to_string(), "orders/7");
    }
}
