//! CLI module for lasagna
//!
//! Provides the `lt storage` command family:
//! - create: Create an empty storage
//! - add: Append a wav file or a directory of wav files
//! - get: Extract one item to a file
//! - describe: Item count, item metadata, ancestry tree
//! - list: Item identifiers, optionally paged

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, OutputFormat, StorageCommand};
pub use commands::{
    add, collect_inputs, configure, create, describe, describe_item, get, list, run, run_command,
    run_storage_command,
};
pub use errors::{CliError, CliErrorCode, CliResult};
