//! Persistent identifier → footer offset log
//!
//! One line per committed record:
//!
//! ```text
//! <hyphenated uuid>:<decimal footer offset>\n
//! ```
//!
//! The log is only ever appended to. It is authoritative: it is never
//! rebuilt from the container.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use super::errors::{IndexError, IndexResult};
use crate::identifier::RecordId;
use crate::observability::{log_event_with_fields, Event, Logger};

/// In-memory view of one index log.
///
/// Backed by a `BTreeMap`, so iteration is sorted by identifier, which for
/// v7 identifiers is also creation order.
///
/// Offsets are kept as written. A negative offset is a well-formed entry;
/// it only fails when its record is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<RecordId, i64>,
}

impl Index {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Footer offset for `id`
    pub fn get(&self, id: &RecordId) -> Option<i64> {
        self.entries.get(id).copied()
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no record has been committed yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> + '_ {
        self.entries.keys()
    }

    /// Later entries for the same identifier replace earlier ones.
    pub(crate) fn insert(&mut self, id: RecordId, offset: i64) {
        self.entries.insert(id, offset);
    }
}

/// Stateless accessor for index log files.
pub struct IndexStore;

impl IndexStore {
    /// Loads the index log at `path`.
    ///
    /// A missing file is an empty index. Lines without a `:` separator are
    /// skipped. A line with a separator but an unparsable identifier, or an
    /// offset that is not a 64-bit signed integer, fails with
    /// `IndexError::Parse` carrying its 1-based line number.
    pub fn load(path: &Path) -> IndexResult<Index> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Index::new()),
            Err(e) => return Err(IndexError::io(path, e)),
        };

        let mut index = Index::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line_number = i + 1;
            let line = line.map_err(|e| IndexError::io(path, e))?;

            let (id_part, offset_part) = match line.split_once(':') {
                Some(parts) => parts,
                None => {
                    if !line.trim().is_empty() {
                        Logger::warn(
                            Event::IndexLineSkipped.as_str(),
                            &[
                                ("line", &line_number.to_string()),
                                ("path", &path.display().to_string()),
                            ],
                        );
                    }
                    continue;
                }
            };

            let id: RecordId = id_part.trim().parse().map_err(|e| IndexError::Parse {
                path: path.to_path_buf(),
                line: line_number,
                reason: format!("{}", e),
            })?;
            let offset: i64 = offset_part.trim().parse().map_err(|e| IndexError::Parse {
                path: path.to_path_buf(),
                line: line_number,
                reason: format!("invalid offset '{}': {}", offset_part.trim(), e),
            })?;

            index.insert(id, offset);
        }

        log_event_with_fields(
            Event::IndexLoaded,
            &[
                ("entries", &index.len().to_string()),
                ("path", &path.display().to_string()),
            ],
        );

        Ok(index)
    }

    /// Appends one `id:offset` line, creating the log if needed.
    ///
    /// With `sync` set the file is fsynced before returning. No
    /// deduplication happens here; identifiers are fresh by construction.
    pub fn append(path: &Path, id: &RecordId, offset: u64, sync: bool) -> IndexResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| IndexError::io(path, e))?;

        let entry = format!("{}:{}\n", id, offset);
        file.write_all(entry.as_bytes())
            .map_err(|e| IndexError::io(path, e))?;

        if sync {
            file.sync_all().map_err(|e| IndexError::io(path, e))?;
        }

        log_event_with_fields(
            Event::IndexAppended,
            &[("id", &id.to_string()), ("offset", &offset.to_string())],
        );

        Ok(())
    }
}
