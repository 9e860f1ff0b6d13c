//! kfs CLI
//!
//! Command-line access to topic partitions through the partition file adapter.
//!
//! # Commands
//!
//! - `topics` - List topics and partition offset ranges
//! - `stat` - Display the file attributes of a partition
//! - `cat` - Open a partition and print everything available
//! - `read` - Perform one windowed read on a partition

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Inspect and read message-log partitions as files.
#[derive(Parser)]
#[command(name = "kfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON bus snapshot
    #[arg(global = true, short, long)]
    snapshot: Option<PathBuf>,

    /// How long reads wait for the next message, in milliseconds
    #[arg(global = true, long, default_value = "5000")]
    idle_timeout_ms: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics and partition offset ranges
    Topics {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display the file attributes of a partition
    Stat {
        /// Topic name
        topic: String,

        /// Partition id
        partition: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Open a partition and print everything available
    Cat {
        /// Topic name
        topic: String,

        /// Partition id
        partition: u32,
    },

    /// Perform one windowed read on a partition
    Read {
        /// Topic name
        topic: String,

        /// Partition id
        partition: u32,

        /// Maximum number of bytes to read
        #[arg(long, default_value = "4096")]
        size: usize,

        /// Read offset (accepted, reads are sequential)
        #[arg(long, default_value = "0")]
        offset: u64,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::file_config(Duration::from_millis(cli.idle_timeout_ms));

    match cli.command {
        Commands::Topics { format } => {
            let snapshot = cli.snapshot.ok_or(commands::CliError::SnapshotRequired("topics"))?;
            commands::topics::run(&snapshot, &format)?;
        }
        Commands::Stat {
            topic,
            partition,
            format,
        } => {
            let snapshot = cli.snapshot.ok_or(commands::CliError::SnapshotRequired("stat"))?;
            commands::stat::run(&snapshot, &topic, partition, config, &format)?;
        }
        Commands::Cat { topic, partition } => {
            let snapshot = cli.snapshot.ok_or(commands::CliError::SnapshotRequired("cat"))?;
            commands::cat::run(&snapshot, &topic, partition, config)?;
        }
        Commands::Read {
            topic,
            partition,
            size,
            offset,
        } => {
            let snapshot = cli.snapshot.ok_or(commands::CliError::SnapshotRequired("read"))?;
            commands::read::run(&snapshot, &topic, partition, config, size, offset)?;
        }
        Commands::Version => {
            println!("kfs CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
