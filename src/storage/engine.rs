//! Storage engine
//!
//! The only entry point callers touch. Every operation is parameterized by
//! a container name, opens the files it needs, and closes them before
//! returning. There is no cached state between calls.
//!
//! Files for container `name` under the storage directory:
//! - `<name>.<ext>`: concatenated `(payload, footer)` records
//! - `<name>.<ext>.idx`: identifier → footer offset log
//!
//! Single writer only. Concurrent inserts into one container interleave
//! undefined; callers must serialize access.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use super::errors::{StorageError, StorageResult};
use super::reader::ContainerReader;
use super::writer::ContainerWriter;
use crate::config::Config;
use crate::identifier::RecordId;
use crate::index::{Index, IndexStore};
use crate::observability::{log_event_with_fields, Event, Logger};

/// Metadata of one record, derived from its footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Record identifier
    pub id: RecordId,
    /// Payload length in bytes
    pub length: u64,
    /// Parent record, if any
    pub parent: Option<RecordId>,
    /// Footer offset inside the container
    pub offset: u64,
}

/// Result of an ancestry walk.
///
/// `entries` starts at the requested record and ends at the root, or at the
/// last record found before the chain broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ancestry {
    /// Records from the starting point towards the root
    pub entries: Vec<Metadata>,
    /// Parent identifier that is absent from the index, if the chain broke
    pub missing_parent: Option<RecordId>,
}

impl Ancestry {
    /// Describes the break of a partial chain
    pub fn break_error(&self) -> Option<StorageError> {
        self.missing_parent.map(|id| StorageError::not_found(id))
    }
}

/// One page of identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Identifiers on this page, ascending
    pub items: Vec<RecordId>,
    /// Total number of records in the container
    pub total: usize,
}

/// Stateless facade over container and index files.
#[derive(Debug, Clone)]
pub struct StorageEngine {
    storage_dir: PathBuf,
    extension: String,
    sync_writes: bool,
    max_ancestry_depth: usize,
}

impl StorageEngine {
    /// Engine rooted at `storage_dir` with default settings.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&Config {
            storage_dir: storage_dir.into(),
            ..Config::default()
        })
    }

    /// Engine using the given configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_dir: config.storage_dir.clone(),
            extension: config.extension.clone(),
            sync_writes: config.sync_writes,
            max_ancestry_depth: config.max_ancestry_depth,
        }
    }

    /// Path of the container file for `name`.
    pub fn container_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self
            .storage_dir
            .join(format!("{}.{}", name, self.extension)))
    }

    /// Path of the index file for `name`.
    pub fn index_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self
            .storage_dir
            .join(format!("{}.{}.idx", name, self.extension)))
    }

    fn load_index(&self, name: &str) -> StorageResult<Index> {
        Ok(IndexStore::load(&self.index_path(name)?)?)
    }

    fn resolve(&self, index: &Index, id: &RecordId) -> StorageResult<u64> {
        let offset = index.get(id).ok_or_else(|| StorageError::not_found(id))?;
        checked_offset(id, offset)
    }

    /// Creates an empty container. The index file appears on first insert.
    pub fn create_container(&self, name: &str) -> StorageResult<()> {
        ContainerWriter::create(&self.container_path(name)?)
    }

    /// Appends `payload` with an optional textual parent identifier.
    ///
    /// The parent is validated before anything is written; its existence
    /// is not checked.
    pub fn insert(
        &self,
        name: &str,
        payload: &[u8],
        parent: Option<&str>,
    ) -> StorageResult<RecordId> {
        let parent = parent
            .map(|p| {
                p.parse::<RecordId>()
                    .map_err(|e| StorageError::invalid_parent(p, e.to_string()))
            })
            .transpose()?;
        self.insert_record(name, payload, parent)
    }

    /// Appends `payload` and its footer, mints an identifier and records
    /// it in the index.
    ///
    /// If the index append fails the record stays in the container without
    /// any identifier pointing at it. That is not rolled back.
    pub fn insert_record(
        &self,
        name: &str,
        payload: &[u8],
        parent: Option<RecordId>,
    ) -> StorageResult<RecordId> {
        let container_path = self.container_path(name)?;
        let index_path = self.index_path(name)?;

        let footer_offset = {
            let mut writer = ContainerWriter::open(&container_path, self.sync_writes)?;
            writer.append(payload, parent)?
        };

        let id = RecordId::mint().ok_or_else(|| {
            StorageError::identifier_generation("Generator returned the reserved nil identifier")
        })?;

        if let Err(e) = IndexStore::append(&index_path, &id, footer_offset, self.sync_writes) {
            log_event_with_fields(
                Event::OrphanRecord,
                &[
                    ("footer_offset", &footer_offset.to_string()),
                    ("path", &container_path.display().to_string()),
                ],
            );
            return Err(e.into());
        }

        Ok(id)
    }

    /// Writes the payload of `id` into `dest`. Returns the byte count.
    pub fn retrieve_into<W: Write>(
        &self,
        name: &str,
        id: &RecordId,
        dest: &mut W,
    ) -> StorageResult<u64> {
        let index = self.load_index(name)?;
        let offset = self.resolve(&index, id)?;

        let mut reader = ContainerReader::open(&self.container_path(name)?)?;
        let (footer, data) = reader.read_record(offset)?;

        dest.write_all(&data)
            .map_err(|e| StorageError::output_failed("Failed to write payload to destination", e))?;
        Ok(footer.length)
    }

    /// Returns the payload of `id`.
    pub fn retrieve(&self, name: &str, id: &RecordId) -> StorageResult<Vec<u8>> {
        let mut data = Vec::new();
        self.retrieve_into(name, id, &mut data)?;
        Ok(data)
    }

    /// Number of committed records. Does not validate the container.
    pub fn describe(&self, name: &str) -> StorageResult<usize> {
        Ok(self.load_index(name)?.len())
    }

    /// All identifiers, ascending (creation order for v7 identifiers).
    pub fn list(&self, name: &str) -> StorageResult<Vec<RecordId>> {
        Ok(self.load_index(name)?.ids().copied().collect())
    }

    /// One 1-based page of the sorted identifier list.
    ///
    /// `page == 0` or `page_size == 0` yields an empty page.
    pub fn list_page(&self, name: &str, page: usize, page_size: usize) -> StorageResult<Page> {
        let index = self.load_index(name)?;
        let total = index.len();

        let items = if page == 0 || page_size == 0 {
            Vec::new()
        } else {
            let skip = (page - 1).saturating_mul(page_size);
            index.ids().skip(skip).take(page_size).copied().collect()
        };

        Ok(Page { items, total })
    }

    /// Metadata of `id` without reading its payload.
    pub fn describe_one(&self, name: &str, id: &RecordId) -> StorageResult<Metadata> {
        let index = self.load_index(name)?;
        let offset = self.resolve(&index, id)?;

        let mut reader = ContainerReader::open(&self.container_path(name)?)?;
        let footer = reader.read_footer(offset)?;

        Ok(Metadata {
            id: *id,
            length: footer.length,
            parent: footer.parent,
            offset,
        })
    }

    /// Follows parent links from `id` to the root.
    ///
    /// Fails with `NotFound` if `id` itself is unknown and with
    /// `AncestryCycle` if a record repeats or the chain exceeds the depth
    /// bound. An unknown parent ends the walk with a partial chain.
    pub fn ancestry(&self, name: &str, id: &RecordId) -> StorageResult<Ancestry> {
        let index = self.load_index(name)?;
        let start_offset = self.resolve(&index, id)?;

        let mut reader = ContainerReader::open(&self.container_path(name)?)?;
        let mut visited = HashSet::new();
        let mut entries = Vec::new();
        let mut current = (*id, start_offset);

        loop {
            let (current_id, offset) = current;

            if !visited.insert(current_id) {
                return Err(StorageError::ancestry_cycle(
                    current_id,
                    format!("Parent chain revisits a record after {} steps", entries.len()),
                ));
            }
            if entries.len() >= self.max_ancestry_depth {
                return Err(StorageError::ancestry_cycle(
                    current_id,
                    format!(
                        "Parent chain exceeds maximum depth {}",
                        self.max_ancestry_depth
                    ),
                ));
            }

            let footer = reader.read_footer(offset)?;
            entries.push(Metadata {
                id: current_id,
                length: footer.length,
                parent: footer.parent,
                offset,
            });

            let parent = match footer.parent {
                Some(parent) => parent,
                None => {
                    return Ok(Ancestry {
                        entries,
                        missing_parent: None,
                    })
                }
            };

            match index.get(&parent) {
                Some(parent_offset) => {
                    current = (parent, checked_offset(&parent, parent_offset)?);
                }
                None => {
                    Logger::warn(
                        Event::AncestryBroken.as_str(),
                        &[
                            ("child", &current_id.to_string()),
                            ("missing_parent", &parent.to_string()),
                        ],
                    );
                    return Ok(Ancestry {
                        entries,
                        missing_parent: Some(parent),
                    });
                }
            }
        }
    }
}

/// Index offsets are signed; a negative one cannot address a footer.
fn checked_offset(id: &RecordId, offset: i64) -> StorageResult<u64> {
    u64::try_from(offset).map_err(|_| {
        let err = StorageError::corrupt_footer(
            offset,
            format!("Negative footer offset in index for {}", id),
        );
        log_event_with_fields(Event::CorruptionDetected, &[("error", &err.to_string())]);
        err
    })
}

fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::invalid_name(name, "Storage name is required"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::invalid_name(
            name,
            "Storage name must not contain path separators",
        ));
    }
    Ok(())
}
