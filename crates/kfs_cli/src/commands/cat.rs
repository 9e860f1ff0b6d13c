//! Cat command implementation.

use super::{load_bus, partition_file};
use kfs_core::{FileConfig, FileNode, PartitionFile};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Runs the cat command.
pub fn run(
    snapshot: &Path,
    topic: &str,
    partition: u32,
    config: FileConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = load_bus(snapshot)?;
    let file = partition_file(&bus, topic, partition, config)?;

    let data = read_everything(&file)?;
    info!("Read {} bytes from {}", data.len(), file.handle());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

/// Opens `file`, drains it until it goes quiet and releases it.
pub fn read_everything(file: &PartitionFile) -> Result<Vec<u8>, kfs_core::FsError> {
    file.open()?;
    let result = file.read_all();
    let released = file.release();
    let data = result?;
    released?;
    Ok(data)
}
