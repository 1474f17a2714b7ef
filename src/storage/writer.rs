//! Container writer
//!
//! Containers are append-only: bytes are never rewritten once committed.
//! A writer is opened per insertion and dropped when the call returns.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::footer::{Footer, FOOTER_SIZE};
use crate::identifier::RecordId;
use crate::observability::{log_event_with_fields, Event};

/// Append handle on one container file.
pub struct ContainerWriter {
    /// Path to the container file
    path: PathBuf,
    /// Underlying file handle, opened in append mode
    file: File,
    /// Container size, i.e. where the next byte lands
    current_offset: u64,
    /// Whether to fsync after each record
    sync: bool,
}

impl ContainerWriter {
    /// Creates an empty container at `path`.
    ///
    /// Fails with `AlreadyExists` if any file is already there; the
    /// existing file is left untouched.
    pub fn create(path: &Path) -> StorageResult<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    StorageError::already_exists(path)
                } else {
                    StorageError::io_error("Failed to create storage file", path, e)
                }
            })?;

        log_event_with_fields(
            Event::ContainerCreated,
            &[("path", &path.display().to_string())],
        );
        Ok(())
    }

    /// Opens an existing container for appending.
    pub fn open(path: &Path, sync: bool) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| StorageError::io_error("Failed to open storage file", path, e))?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read storage metadata", path, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_offset,
            sync,
        })
    }

    /// Appends `payload` followed by its footer.
    ///
    /// Returns the footer offset, which is what the index stores.
    pub fn append(&mut self, payload: &[u8], parent: Option<RecordId>) -> StorageResult<u64> {
        let start_offset = self.current_offset;

        self.file.write_all(payload).map_err(|e| {
            StorageError::io_error_at("Failed to write payload", &self.path, start_offset, e)
        })?;

        let footer_offset = start_offset + payload.len() as u64;
        let footer = Footer::new(payload.len() as u64, parent).encode();

        self.file.write_all(&footer).map_err(|e| {
            StorageError::io_error_at("Failed to write footer", &self.path, footer_offset, e)
        })?;

        if self.sync {
            self.file.sync_all().map_err(|e| {
                StorageError::io_error_at(
                    "fsync failed after writing record",
                    &self.path,
                    footer_offset,
                    e,
                )
            })?;
        }

        self.current_offset = footer_offset + FOOTER_SIZE as u64;

        log_event_with_fields(
            Event::RecordAppended,
            &[
                ("footer_offset", &footer_offset.to_string()),
                ("length", &payload.len().to_string()),
                ("path", &self.path.display().to_string()),
            ],
        );

        Ok(footer_offset)
    }
}
