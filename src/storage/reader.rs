//! Container reader with strict corruption detection
//!
//! Reads are random-access: the index supplies a footer offset, the footer
//! supplies the payload length, the payload sits directly before it.
//!
//! - Magic mismatch or a footer past end of file → `CorruptFooter`
//! - Data span starting before byte 0 → `CorruptRecord`

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::footer::{Footer, FOOTER_SIZE};
use crate::observability::{log_event_with_fields, Event};

/// Read handle on one container file.
pub struct ContainerReader {
    /// Path to the container file
    path: PathBuf,
    /// Underlying file handle
    file: File,
    /// Total file size
    file_size: u64,
}

impl ContainerReader {
    /// Opens the container for reading.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)
            .map_err(|e| StorageError::io_error("Failed to open storage file", path, e))?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read storage metadata", path, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_size,
        })
    }

    fn seek_to(&mut self, offset: u64) -> StorageResult<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StorageError::io_error_at("Failed to seek", &self.path, offset, e))?;
        Ok(())
    }

    fn corruption(&self, err: StorageError) -> StorageError {
        log_event_with_fields(
            Event::CorruptionDetected,
            &[
                ("error", &err.to_string()),
                ("path", &self.path.display().to_string()),
            ],
        );
        err
    }

    /// Reads and validates the footer at `offset`.
    pub fn read_footer(&mut self, offset: u64) -> StorageResult<Footer> {
        let end = offset.checked_add(FOOTER_SIZE as u64);
        if end.map_or(true, |end| end > self.file_size) {
            return Err(self.corruption(StorageError::corrupt_footer(
                offset,
                format!(
                    "Footer extends past end of storage ({} bytes)",
                    self.file_size
                ),
            )));
        }

        self.seek_to(offset)?;
        let mut buf = [0u8; FOOTER_SIZE];
        self.file.read_exact(&mut buf).map_err(|e| {
            StorageError::io_error_at("Failed to read footer", &self.path, offset, e)
        })?;

        let footer = Footer::decode(&buf)
            .map_err(|e| self.corruption(StorageError::corrupt_footer(offset, e.to_string())))?;

        if footer.length > offset {
            return Err(self.corruption(StorageError::corrupt_record(
                offset,
                format!(
                    "Invalid data start: length {} exceeds footer offset",
                    footer.length
                ),
            )));
        }

        Ok(footer)
    }

    /// Reads the payload belonging to `footer`, which was read at `offset`.
    pub fn read_payload(&mut self, offset: u64, footer: &Footer) -> StorageResult<Vec<u8>> {
        let data_start = offset.checked_sub(footer.length).ok_or_else(|| {
            self.corruption(StorageError::corrupt_record(
                offset,
                format!("Invalid data start: length {}", footer.length),
            ))
        })?;
        let length = usize::try_from(footer.length).map_err(|_| {
            StorageError::corrupt_record(offset, format!("Invalid length: {}", footer.length))
        })?;

        self.seek_to(data_start)?;
        let mut data = vec![0u8; length];
        self.file.read_exact(&mut data).map_err(|e| {
            StorageError::io_error_at("Failed to read payload", &self.path, data_start, e)
        })?;

        Ok(data)
    }

    /// Reads the footer at `offset` and the payload before it.
    pub fn read_record(&mut self, offset: u64) -> StorageResult<(Footer, Vec<u8>)> {
        let footer = self.read_footer(offset)?;
        let data = self.read_payload(offset, &footer)?;

        log_event_with_fields(
            Event::RecordRead,
            &[
                ("footer_offset", &offset.to_string()),
                ("length", &footer.length.to_string()),
            ],
        );

        Ok((footer, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::RecordId;
    use crate::storage::errors::StorageErrorCode;
    use crate::storage::writer::ContainerWriter;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use tempfile::TempDir;

    fn container_with(records: &[(&[u8], Option<RecordId>)]) -> (TempDir, PathBuf, Vec<u64>) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.ls");
        ContainerWriter::create(&path).unwrap();

        let mut writer = ContainerWriter::open(&path, false).unwrap();
        let offsets = records
            .iter()
            .map(|(data, parent)| writer.append(data, *parent).unwrap())
            .collect();
        (temp_dir, path, offsets)
    }

    #[test]
    fn test_read_back_records() {
        let parent = RecordId::mint().unwrap();
        let (_dir, path, offsets) =
            container_with(&[(&b"first clip"[..], None), (&b"second"[..], Some(parent))]);

        let mut reader = ContainerReader::open(&path).unwrap();

        let (footer, data) = reader.read_record(offsets[0]).unwrap();
        assert_eq!(data, b"first clip");
        assert_eq!(footer.parent, None);

        let (footer, data) = reader.read_record(offsets[1]).unwrap();
        assert_eq!(data, b"second");
        assert_eq!(footer.parent, Some(parent));
    }

    #[test]
    fn test_empty_payload() {
        let (_dir, path, offsets) = container_with(&[(&b""[..], None)]);
        let mut reader = ContainerReader::open(&path).unwrap();
        let (footer, data) = reader.read_record(offsets[0]).unwrap();
        assert_eq!(footer.length, 0);
        assert!(data.is_empty());
    }

    #[test]
    fn test_magic_corruption_detected() {
        let (_dir, path, offsets) = container_with(&[(&b"payload"[..], None)]);

        let mut bytes = fs::read(&path).unwrap();
        bytes[offsets[0] as usize + 2] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let mut reader = ContainerReader::open(&path).unwrap();
        let err = reader.read_footer(offsets[0]).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::CorruptFooter);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_footer_past_end_detected() {
        let (_dir, path, _) = container_with(&[(&b"payload"[..], None)]);
        let mut reader = ContainerReader::open(&path).unwrap();
        let err = reader.read_footer(1000).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::CorruptFooter);
    }

    #[test]
    fn test_length_larger_than_offset_detected() {
        let (_dir, path, offsets) = container_with(&[(&b"abc"[..], None)]);

        // Forge the length field to reach before byte 0
        let mut file = OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(offsets[0] + 4)).unwrap();
        file.write_all(&100u64.to_be_bytes()).unwrap();
        drop(file);

        let mut reader = ContainerReader::open(&path).unwrap();
        let err = reader.read_record(offsets[0]).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::CorruptRecord);
    }
}
