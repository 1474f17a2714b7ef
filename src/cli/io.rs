//! Output helpers for CLI commands
//!
//! Commands write to a caller-supplied writer so they can be exercised
//! against a buffer in tests.

use std::io::Write;

use serde::Serialize;

use super::errors::CliResult;
use crate::identifier::RecordId;
use crate::storage::{Ancestry, Metadata};

/// Write any serializable value as one pretty JSON document
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write one identifier per line
pub fn write_ids<W: Write>(out: &mut W, ids: &[RecordId]) -> CliResult<()> {
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    out.flush()?;
    Ok(())
}

fn parent_label(parent: Option<RecordId>) -> String {
    parent.map_or_else(|| "None".to_string(), |p| p.to_string())
}

/// Write the metadata block of one item
pub fn write_metadata<W: Write>(out: &mut W, meta: &Metadata) -> CliResult<()> {
    writeln!(out, "UUID: {}", meta.id)?;
    writeln!(out, "Length: {}", meta.length)?;
    writeln!(out, "Offset: {}", meta.offset)?;
    writeln!(out, "Parent: {}", parent_label(meta.parent))?;
    match meta.id.created_at() {
        Some(ts) => writeln!(out, "Created: {}", ts.to_rfc3339())?,
        None => writeln!(out, "Created: unknown")?,
    }
    Ok(())
}

/// Write the numbered ancestry tree, starting at the described item
pub fn write_ancestry<W: Write>(out: &mut W, ancestry: &Ancestry) -> CliResult<()> {
    writeln!(out, "--- Ancestry Tree ---")?;
    for (depth, entry) in ancestry.entries.iter().enumerate() {
        writeln!(
            out,
            "{}. {} (Parent: {})",
            depth + 1,
            entry.id,
            parent_label(entry.parent)
        )?;
    }
    out.flush()?;
    Ok(())
}
