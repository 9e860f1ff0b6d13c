//! Stat command implementation.

use super::{load_bus, partition_file};
use kfs_core::{FileAttributes, FileConfig, FileNode, FileSize};
use serde::Serialize;
use std::path::Path;

/// Attributes of a partition file.
#[derive(Debug, Serialize)]
pub struct StatResult {
    /// `topic/partition`.
    pub file: String,
    /// Reported size in bytes.
    pub size: u64,
    /// Whether the size is an offset-span estimate.
    pub estimated: bool,
    /// Oldest retained offset, when estimated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<i64>,
    /// Next offset to be produced, when estimated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<i64>,
    /// Permission bits, octal.
    pub mode: String,
    /// 512-byte blocks.
    pub blocks: u64,
}

impl StatResult {
    fn new(file: String, attrs: &FileAttributes) -> Self {
        let (oldest, newest) = match attrs.size {
            FileSize::Estimated { oldest, newest } => (Some(oldest), Some(newest)),
            _ => (None, None),
        };
        Self {
            file,
            size: attrs.size(),
            estimated: attrs.size.is_estimate(),
            oldest,
            newest,
            mode: format!("{:o}", attrs.permissions),
            blocks: attrs.blocks(),
        }
    }
}

/// Runs the stat command.
pub fn run(
    snapshot: &Path,
    topic: &str,
    partition: u32,
    config: FileConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = load_bus(snapshot)?;
    let result = collect(&bus, topic, partition, config)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("File:   {}", result.file);
            println!(
                "Size:   {} bytes{}",
                result.size,
                if result.estimated { " (estimated)" } else { "" }
            );
            if let (Some(oldest), Some(newest)) = (result.oldest, result.newest) {
                println!("Range:  [{oldest}, {newest})");
            }
            println!("Mode:   {}", result.mode);
            println!("Blocks: {}", result.blocks);
        }
    }

    Ok(())
}

/// Resolves the attributes of a closed partition file.
pub fn collect(
    bus: &std::sync::Arc<kfs_bus::InMemoryBus>,
    topic: &str,
    partition: u32,
    config: FileConfig,
) -> Result<StatResult, Box<dyn std::error::Error>> {
    let file = partition_file(bus, topic, partition, config)?;
    let attrs = file.attributes()?;
    Ok(StatResult::new(file.handle().to_string(), &attrs))
}
