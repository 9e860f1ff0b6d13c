//! Test fixtures and partition file helpers.

use kfs_bus::{BusResult, ConnectionProvider, InMemoryBus, Offset, OffsetBoundary};
use kfs_core::{FileConfig, FileNode, PartitionFile, PartitionHandle};
use std::sync::Arc;
use std::time::Duration;

/// Idle timeout used by fixtures so quiet reads return quickly.
pub const FAST_IDLE: Duration = Duration::from_millis(20);

/// Topic used by single-partition fixtures.
pub const TEST_TOPIC: &str = "test-topic";

/// Creates a bus with one topic whose partitions hold the given payloads.
pub fn seeded_bus(topic: &str, partitions: &[&[&str]]) -> Arc<InMemoryBus> {
    let bus = Arc::new(InMemoryBus::new());
    bus.create_topic(topic, partitions.len().max(1) as u32);
    for (partition, messages) in partitions.iter().enumerate() {
        for message in messages.iter() {
            bus.produce(topic, partition as u32, message.as_bytes().to_vec())
                .expect("Seeded partition should exist");
        }
    }
    bus
}

/// A partition file on partition 0 of [`TEST_TOPIC`], with its bus.
pub struct TestFile {
    /// The bus behind the file.
    pub bus: Arc<InMemoryBus>,
    /// The file under test.
    pub file: PartitionFile,
}

impl TestFile {
    /// Creates a closed file over a partition holding `messages`.
    pub fn new(messages: &[&str]) -> Self {
        Self::with_config(messages, FileConfig::new().idle_timeout(FAST_IDLE))
    }

    /// Creates a closed file with a custom configuration.
    pub fn with_config(messages: &[&str], config: FileConfig) -> Self {
        let bus = seeded_bus(TEST_TOPIC, &[messages]);
        let file = PartitionFile::with_bus(
            PartitionHandle::new(TEST_TOPIC, 0),
            Arc::clone(&bus),
            config,
        );
        Self { bus, file }
    }

    /// Creates a file and opens it.
    pub fn opened(messages: &[&str]) -> Self {
        let test_file = Self::new(messages);
        test_file.file.open().expect("Failed to open test file");
        test_file
    }

    /// Appends a message to the file's partition.
    pub fn produce(&self, payload: &str) -> Offset {
        self.bus
            .produce(TEST_TOPIC, 0, payload.as_bytes().to_vec())
            .expect("Test partition should exist")
    }
}

impl std::ops::Deref for TestFile {
    type Target = PartitionFile;

    fn deref(&self) -> &Self::Target {
        &self.file
    }
}

/// Runs a test against an opened file whose partition holds `messages`.
///
/// The file is released afterwards.
pub fn with_open_file<F, R>(messages: &[&str], f: F) -> R
where
    F: FnOnce(&PartitionFile) -> R,
{
    let test_file = TestFile::opened(messages);
    let result = f(&test_file.file);
    let _ = test_file.file.release();
    result
}

/// A connection provider reporting fixed boundary offsets.
#[derive(Debug, Clone, Copy)]
pub struct StaticOffsets {
    /// Reported oldest offset.
    pub oldest: Offset,
    /// Reported newest offset.
    pub newest: Offset,
}

impl StaticOffsets {
    /// Creates a provider reporting `oldest` and `newest`.
    pub fn new(oldest: Offset, newest: Offset) -> Self {
        Self { oldest, newest }
    }
}

impl ConnectionProvider for StaticOffsets {
    fn ensure_connected(&self) -> BusResult<()> {
        Ok(())
    }

    fn resolve_offset(
        &self,
        _topic: &str,
        _partition: u32,
        boundary: OffsetBoundary,
    ) -> BusResult<Offset> {
        Ok(match boundary {
            OffsetBoundary::Oldest => self.oldest,
            OffsetBoundary::Newest => self.newest,
        })
    }
}

/// Common scenarios.
pub mod scenarios {
    use super::*;

    /// A partition holding `["a", "bb", "ccc"]`.
    pub fn abc() -> TestFile {
        TestFile::new(&["a", "bb", "ccc"])
    }

    /// A partition whose oldest messages have been removed by retention.
    pub fn truncated(retained_from: Offset) -> TestFile {
        let test_file = TestFile::new(&["r0", "r1", "r2", "r3", "r4"]);
        test_file
            .bus
            .truncate_before(TEST_TOPIC, 0, retained_from)
            .expect("Test partition should exist");
        test_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_bus_layout() {
        let bus = seeded_bus("t", &[&["a"], &["b", "c"]]);
        assert_eq!(bus.partitions("t"), Some(2));
        assert_eq!(bus.resolve_offset("t", 1, OffsetBoundary::Newest).unwrap(), 2);
    }

    #[test]
    fn with_open_file_releases() {
        let test_file = TestFile::opened(&["a"]);
        assert!(test_file.is_open());

        let len = with_open_file(&["a", "bb"], |file| file.read_all().unwrap().len());
        assert_eq!(len, 5);
    }

    #[test]
    fn truncated_scenario() {
        let test_file = scenarios::truncated(3);
        assert_eq!(test_file.attributes().unwrap().size(), 2);
    }

    #[test]
    fn static_offsets() {
        let provider = StaticOffsets::new(5, 9);
        assert_eq!(
            provider.resolve_offset("x", 0, OffsetBoundary::Oldest).unwrap(),
            5
        );
    }
}
