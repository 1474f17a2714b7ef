//! CLI argument definitions using clap
//!
//! Commands:
//! - lt storage create <storage_name>
//! - lt storage add <storage_name> <wav_file_or_dir> [--parent <id>]
//! - lt storage get <storage_name> <id> <wav_file>
//! - lt storage describe <storage_name> [id] [--ancestry] [--json]
//! - lt storage list <storage_name> [--page N] [--page-size M] [--json]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// lt - Lasagna clip storage
#[derive(Parser, Debug)]
#[command(name = "lt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ./lasagna.json if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every storage event to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Manage storage
    Storage {
        #[command(subcommand)]
        action: StorageCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StorageCommand {
    /// Create an empty storage
    Create {
        /// Storage name
        name: String,
    },

    /// Add a wav file, or every .wav file of a directory
    Add {
        /// Storage name
        name: String,
        /// File or directory to add
        path: PathBuf,
        /// Parent identifier for every added item
        #[arg(long)]
        parent: Option<String>,
    },

    /// Write a stored item to a file
    Get {
        /// Storage name
        name: String,
        /// Item identifier
        id: String,
        /// Output file
        output: PathBuf,
    },

    /// Count items, or show one item's metadata
    Describe {
        /// Storage name
        name: String,
        /// Item identifier
        id: Option<String>,
        /// Show the ancestry tree of the item
        #[arg(long)]
        ancestry: bool,
        #[command(flatten)]
        format: OutputFormat,
    },

    /// List item identifiers, oldest first
    List {
        /// Storage name
        name: String,
        /// 1-based page number; lists everything when absent
        #[arg(long)]
        page: Option<usize>,
        /// Items per page
        #[arg(long, default_value_t = 50)]
        page_size: usize,
        #[command(flatten)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFormat {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
