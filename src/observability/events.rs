//! Observable events
//!
//! Events are explicit and typed; the logger only ever sees their string
//! form.

use std::fmt;

/// Observable events in lasagna
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Container lifecycle
    /// Empty container file created
    ContainerCreated,

    // Write path
    /// Payload and footer written
    RecordAppended,
    /// Index line appended
    IndexAppended,
    /// Record written but its index line was not (FATAL)
    OrphanRecord,

    // Read path
    /// Index log loaded
    IndexLoaded,
    /// Index line without separator ignored
    IndexLineSkipped,
    /// Footer decoded (and payload read, if requested)
    RecordRead,
    /// Footer or data span failed validation (FATAL)
    CorruptionDetected,

    // Lineage
    /// Parent chain ends at an identifier missing from the index
    AncestryBroken,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ContainerCreated => "CONTAINER_CREATED",
            Event::RecordAppended => "RECORD_APPENDED",
            Event::IndexAppended => "INDEX_APPENDED",
            Event::OrphanRecord => "ORPHAN_RECORD",
            Event::IndexLoaded => "INDEX_LOADED",
            Event::IndexLineSkipped => "INDEX_LINE_SKIPPED",
            Event::RecordRead => "RECORD_READ",
            Event::CorruptionDetected => "CORRUPTION_DETECTED",
            Event::AncestryBroken => "ANCESTRY_BROKEN",
        }
    }

    /// Returns true if this event indicates a damaged container
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::OrphanRecord | Event::CorruptionDetected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
