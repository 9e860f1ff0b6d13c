//! Read command implementation.

use super::{load_bus, partition_file};
use kfs_core::{FileConfig, FileNode};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Runs the read command.
pub fn run(
    snapshot: &Path,
    topic: &str,
    partition: u32,
    config: FileConfig,
    size: usize,
    offset: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = load_bus(snapshot)?;
    let file = partition_file(&bus, topic, partition, config)?;

    file.open()?;
    let result = file.read(offset, size);
    file.release()?;
    let data = result?;

    if data.len() < size {
        info!("Short read: {} of {} bytes", data.len(), size);
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::snapshot_file;
    use std::time::Duration;

    #[test]
    fn reads_one_window() {
        let snapshot = snapshot_file();
        let config = FileConfig::new().idle_timeout(Duration::from_millis(20));
        run(snapshot.path(), "orders", 0, config, 5, 0).unwrap();
    }

    #[test]
    fn unknown_partition_fails() {
        let snapshot = snapshot_file();
        let result = run(snapshot.path(), "orders", 7, FileConfig::new(), 5, 0);
        assert!(result.is_err());
    }
}
