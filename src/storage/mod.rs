//! Clip storage subsystem for lasagna
//!
//! A container is a growable blob file of `(payload, footer)` records with
//! a side index mapping identifiers to footer offsets.
//!
//! # Design Principles
//!
//! - Append-only (bytes are never rewritten or removed)
//! - Magic number verified on every footer read
//! - Random access through the index, no scan from byte 0
//! - Optional parent link per record, walked by `ancestry`
//!
//! # Write order
//!
//! `insert` writes payload, then footer, then the index line. A failure on
//! the index line leaves an orphan record in the container that no
//! identifier reaches; it is logged as `ORPHAN_RECORD` and needs manual
//! inspection.

mod engine;
mod errors;
mod footer;
mod reader;
mod writer;

pub use engine::{Ancestry, Metadata, Page, StorageEngine};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use footer::{Footer, FOOTER_SIZE, MAGIC_NUMBER};
pub use reader::ContainerReader;
pub use writer::ContainerWriter;
