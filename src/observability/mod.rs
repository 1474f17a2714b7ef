//! Observability subsystem for lasagna
//!
//! Structured JSON logging of typed lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//!
//! # Usage
//!
//! ```ignore
//! use lasagna::observability::{log_event_with_fields, Event, Logger};
//!
//! log_event_with_fields(Event::RecordAppended, &[("offset", "48")]);
//! Logger::warn("INDEX_LINE_SKIPPED", &[("line", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
///
/// Routine events are TRACE; fatal events are FATAL.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Trace
    };
    Logger::log(severity, event.as_str(), fields);
}
