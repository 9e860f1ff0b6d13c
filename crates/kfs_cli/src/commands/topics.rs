//! Topics command implementation.

use super::load_bus;
use kfs_bus::{ConnectionProvider, InMemoryBus, OffsetBoundary};
use serde::Serialize;
use std::path::Path;

/// Offset range of one partition.
#[derive(Debug, Serialize)]
pub struct PartitionInfo {
    /// Topic name.
    pub topic: String,
    /// Partition id.
    pub partition: u32,
    /// Oldest retained offset.
    pub oldest: i64,
    /// Next offset to be produced.
    pub newest: i64,
}

/// Runs the topics command.
pub fn run(snapshot: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bus = load_bus(snapshot)?;
    let partitions = collect(&bus)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&partitions)?);
        }
        _ => {
            println!("{:<32} {:>9} {:>12} {:>12}", "TOPIC", "PARTITION", "OLDEST", "NEWEST");
            for p in &partitions {
                println!(
                    "{:<32} {:>9} {:>12} {:>12}",
                    p.topic, p.partition, p.oldest, p.newest
                );
            }
        }
    }

    Ok(())
}

/// Lists every partition of every topic with its offset range.
pub fn collect(bus: &InMemoryBus) -> Result<Vec<PartitionInfo>, kfs_bus::BusError> {
    let mut partitions = Vec::new();
    for topic in bus.topics() {
        for partition in 0..bus.partitions(&topic).unwrap_or(0) {
            partitions.push(PartitionInfo {
                oldest: bus.resolve_offset(&topic, partition, OffsetBoundary::Oldest)?,
                newest: bus.resolve_offset(&topic, partition, OffsetBoundary::Newest)?,
                topic: topic.clone(),
                partition,
            });
        }
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::snapshot_file;

    #[test]
    fn lists_offset_ranges() {
        let snapshot = snapshot_file();
        let bus = load_bus(snapshot.path()).unwrap();

        let partitions = collect(&bus).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!((partitions[0].oldest, partitions[0].newest), (4, 7));
        assert_eq!((partitions[1].oldest, partitions[1].newest), (0, 0));
    }
}
