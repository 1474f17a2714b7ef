//! Index subsystem for lasagna
//!
//! The index maps record identifiers to footer offsets inside a container.
//! It lives next to the container as `<name>.<ext>.idx`.
//!
//! # Design Principles
//!
//! - Append-only text log, one line per committed record
//! - Authoritative: never rebuilt from the container
//! - Created lazily on the first insertion
//! - Deterministic: sorted iteration order
//!
//! Every lookup reloads the whole log. That is O(n) per operation and fine
//! for single-operator clip corpora.

mod errors;
mod store;

pub use errors::{IndexError, IndexResult};
pub use store::{Index, IndexStore};
