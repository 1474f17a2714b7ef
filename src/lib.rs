//! lasagna - append-only clip storage
//!
//! A container file of raw payloads, each followed by a fixed 64-byte
//! footer, plus a text index mapping time-ordered identifiers to footer
//! offsets. Records may name a parent record, forming ancestry chains.

pub mod cli;
pub mod config;
pub mod identifier;
pub mod index;
pub mod observability;
pub mod storage;
