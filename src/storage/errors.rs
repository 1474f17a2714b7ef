//! Storage error types
//!
//! Error codes:
//! - LASAGNA_ALREADY_EXISTS (ERROR severity)
//! - LASAGNA_NOT_FOUND (ERROR severity)
//! - LASAGNA_INVALID_PARENT (ERROR severity)
//! - LASAGNA_INVALID_NAME (ERROR severity)
//! - LASAGNA_IO_ERROR (ERROR severity)
//! - LASAGNA_CORRUPT_FOOTER (FATAL severity)
//! - LASAGNA_CORRUPT_RECORD (FATAL severity)
//! - LASAGNA_INDEX_PARSE_ERROR (FATAL severity)
//! - LASAGNA_ANCESTRY_CYCLE (FATAL severity)
//! - LASAGNA_ID_GENERATION (FATAL severity)

use std::fmt;
use std::io;
use std::path::Path;

use crate::index::IndexError;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the container is still usable
    Error,
    /// The container holds data that cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Container file already present on create
    AlreadyExists,
    /// Identifier absent from the index
    NotFound,
    /// Parent identifier is not a valid 128-bit identifier
    InvalidParent,
    /// Container name cannot be mapped to a file
    InvalidName,
    /// Footer magic mismatch or truncated footer
    CorruptFooter,
    /// Computed data span falls outside the container
    CorruptRecord,
    /// Index line with an unparsable field
    IndexParseError,
    /// Parent chain loops back on itself
    AncestryCycle,
    /// Identifier generator returned the reserved nil value
    IdentifierGeneration,
    /// Underlying file-system failure
    IoError,
}

impl StorageErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::AlreadyExists => "LASAGNA_ALREADY_EXISTS",
            StorageErrorCode::NotFound => "LASAGNA_NOT_FOUND",
            StorageErrorCode::InvalidParent => "LASAGNA_INVALID_PARENT",
            StorageErrorCode::InvalidName => "LASAGNA_INVALID_NAME",
            StorageErrorCode::CorruptFooter => "LASAGNA_CORRUPT_FOOTER",
            StorageErrorCode::CorruptRecord => "LASAGNA_CORRUPT_RECORD",
            StorageErrorCode::IndexParseError => "LASAGNA_INDEX_PARSE_ERROR",
            StorageErrorCode::AncestryCycle => "LASAGNA_ANCESTRY_CYCLE",
            StorageErrorCode::IdentifierGeneration => "LASAGNA_ID_GENERATION",
            StorageErrorCode::IoError => "LASAGNA_IO_ERROR",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::CorruptFooter
            | StorageErrorCode::CorruptRecord
            | StorageErrorCode::IndexParseError
            | StorageErrorCode::AncestryCycle
            | StorageErrorCode::IdentifierGeneration => Severity::Fatal,
            StorageErrorCode::AlreadyExists
            | StorageErrorCode::NotFound
            | StorageErrorCode::InvalidParent
            | StorageErrorCode::InvalidName
            | StorageErrorCode::IoError => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug)]
pub struct StorageError {
    /// Error code
    code: StorageErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context (path, offset, identifier)
    details: Option<String>,
    /// Underlying error if applicable
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Container file already exists
    pub fn already_exists(path: &Path) -> Self {
        Self::new(StorageErrorCode::AlreadyExists, "Storage already exists")
            .with_details(format!("path: {}", path.display()))
    }

    /// Identifier is not present in the index
    pub fn not_found(identifier: impl fmt::Display) -> Self {
        Self::new(StorageErrorCode::NotFound, "Identifier not found")
            .with_details(format!("identifier: {}", identifier))
    }

    /// Parent identifier could not be parsed
    pub fn invalid_parent(parent: &str, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::InvalidParent, reason)
            .with_details(format!("parent: {}", parent))
    }

    /// Container name rejected before touching the file system
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::InvalidName, reason).with_details(format!("name: {:?}", name))
    }

    /// Footer at `offset` does not carry the magic number, or cannot exist
    /// there
    pub fn corrupt_footer(offset: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::CorruptFooter, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    /// Data span of the record at `offset` is out of range
    pub fn corrupt_record(offset: u64, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::CorruptRecord, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    /// Parent chain revisits `identifier`
    pub fn ancestry_cycle(identifier: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::AncestryCycle, reason)
            .with_details(format!("identifier: {}", identifier))
    }

    /// Identifier generator misbehaved
    pub fn identifier_generation(reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::IdentifierGeneration, reason)
    }

    /// File-system failure on `path`
    pub fn io_error(message: impl Into<String>, path: &Path, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            details: Some(format!("path: {}", path.display())),
            source: Some(Box::new(source)),
        }
    }

    /// File-system failure at a known byte offset of `path`
    pub fn io_error_at(
        message: impl Into<String>,
        path: &Path,
        offset: u64,
        source: io::Error,
    ) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            details: Some(format!("path: {}, byte_offset: {}", path.display(), offset)),
            source: Some(Box::new(source)),
        }
    }

    /// Failure writing to a caller-supplied sink
    pub fn output_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether the container should be considered damaged
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<IndexError> for StorageError {
    fn from(err: IndexError) -> Self {
        let (code, details) = match &err {
            IndexError::Io { path, .. } => {
                (StorageErrorCode::IoError, format!("path: {}", path.display()))
            }
            IndexError::Parse { path, line, .. } => (
                StorageErrorCode::IndexParseError,
                format!("path: {}, line: {}", path.display(), line),
            ),
        };
        Self {
            code,
            message: "Index failure".to_string(),
            details: Some(details),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
