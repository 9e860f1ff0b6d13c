//! CLI command implementations.

pub mod cat;
pub mod read;
pub mod stat;
pub mod topics;

use kfs_bus::{BusSnapshot, InMemoryBus};
use kfs_core::{FileConfig, PartitionFile, PartitionHandle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// A command needs a bus snapshot and none was given.
    #[error("bus snapshot path required for {0}")]
    SnapshotRequired(&'static str),

    /// The snapshot has no such topic or partition.
    #[error("no partition {partition} in topic {topic:?}")]
    UnknownPartition {
        /// Topic name.
        topic: String,
        /// Partition id.
        partition: u32,
    },
}

/// Builds the file configuration from CLI flags.
pub fn file_config(idle_timeout: Duration) -> FileConfig {
    FileConfig::new().idle_timeout(idle_timeout)
}

/// Loads a snapshot into an in-memory bus.
pub fn load_bus(path: &Path) -> Result<Arc<InMemoryBus>, Box<dyn std::error::Error>> {
    info!("Loading bus snapshot from {:?}", path);
    let snapshot = BusSnapshot::load(path)?;
    Ok(Arc::new(InMemoryBus::from_snapshot(&snapshot)))
}

/// Creates a closed partition file, checking the partition exists.
pub fn partition_file(
    bus: &Arc<InMemoryBus>,
    topic: &str,
    partition: u32,
    config: FileConfig,
) -> Result<PartitionFile, CliError> {
    match bus.partitions(topic) {
        Some(count) if partition < count => Ok(PartitionFile::with_bus(
            PartitionHandle::new(topic, partition),
            Arc::clone(bus),
            config,
        )),
        _ => Err(CliError::UnknownPartition {
            topic: topic.to_string(),
            partition,
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Writes a snapshot with one topic `orders` holding two partitions.
    pub fn snapshot_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"topics":[{{"name":"orders","partitions":[
                {{"base_offset":4,"messages":["a","bb","ccc"]}},
                {{"messages":[]}}
            ]}}]}}"#
        )
        .unwrap();
        file
    }
}
