//! Record identifiers
//!
//! Every stored record is addressed by a time-ordered 128-bit UUID (v7)
//! minted at insertion time. The same value is embedded in a child's
//! footer as its parent reference.
//!
//! The all-zero UUID is reserved: in a footer it means "no parent", so it
//! can never be handed out as a record's own identifier.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one committed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Width of the identifier in bytes.
    pub const LEN: usize = 16;

    /// Mints a fresh time-ordered identifier.
    ///
    /// Returns `None` only if the generator produced the reserved nil value.
    pub fn mint() -> Option<Self> {
        Self::from_uuid(Uuid::now_v7())
    }

    /// Wraps a UUID, rejecting the reserved nil value.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        if uuid.is_nil() {
            None
        } else {
            Some(Self(uuid))
        }
    }

    /// Decodes the 16 raw footer bytes. All-zero decodes to `None`.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Option<Self> {
        Self::from_uuid(Uuid::from_bytes(bytes))
    }

    /// Returns the raw big-endian bytes as stored in a footer.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_bytes()
    }

    /// Creation time embedded in a v7 identifier, if any.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.0.get_timestamp()?.to_unix();
        Utc.timestamp_opt(secs as i64, nanos).single()
    }
}

/// Error returned when a string is not a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    input: String,
    reason: String,
}

impl ParseIdError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid identifier '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for RecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s.trim()).map_err(|e| ParseIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_uuid(uuid).ok_or_else(|| ParseIdError {
            input: s.to_string(),
            reason: "the nil identifier is reserved".to_string(),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hyphenated lowercase, the index file format.
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_ids_are_distinct_and_ordered() {
        let a = RecordId::mint().unwrap();
        let b = RecordId::mint().unwrap();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let id = RecordId::mint().unwrap();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn test_nil_is_rejected() {
        assert!(RecordId::from_bytes([0u8; 16]).is_none());
        let err = "00000000-0000-0000-0000-000000000000"
            .parse::<RecordId>()
            .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = "not-a-uuid".parse::<RecordId>().unwrap_err();
        assert_eq!(err.input(), "not-a-uuid");
    }

    #[test]
    fn test_created_at_is_recent() {
        let id = RecordId::mint().unwrap();
        let created = id.created_at().unwrap();
        let drift = (Utc::now() - created).num_seconds().abs();
        assert!(drift < 60);
    }
}
