//! Record footer codec
//!
//! A record is the raw payload followed by a fixed 64-byte footer. The
//! index points at the footer; the payload is found by walking back
//! `length` bytes.
//!
//! ```text
//! +------------------+ dataStart
//! | Payload          | (length bytes, verbatim)
//! +------------------+ footerOffset = dataStart + length
//! | Magic            | (u32 BE, 0x14159265)
//! +------------------+
//! | Length           | (u64 BE)
//! +------------------+
//! | Parent ID        | (16 bytes, all-zero = no parent)
//! +------------------+
//! | Reserved         | (36 bytes, zero)
//! +------------------+
//! ```

use std::io;

use crate::identifier::RecordId;

/// Magic tag at the start of every footer
pub const MAGIC_NUMBER: u32 = 0x1415_9265;

/// Size of the footer in bytes
pub const FOOTER_SIZE: usize = 64;

const MAGIC_RANGE: std::ops::Range<usize> = 0..4;
const LENGTH_RANGE: std::ops::Range<usize> = 4..12;
const PARENT_RANGE: std::ops::Range<usize> = 12..28;

/// Decoded footer of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Payload length in bytes
    pub length: u64,
    /// Parent record, if any
    pub parent: Option<RecordId>,
}

impl Footer {
    /// Creates a footer for a payload of `length` bytes
    pub fn new(length: u64, parent: Option<RecordId>) -> Self {
        Self { length, parent }
    }

    /// Encodes the footer. Reserved bytes are zero.
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[MAGIC_RANGE].copy_from_slice(&MAGIC_NUMBER.to_be_bytes());
        buf[LENGTH_RANGE].copy_from_slice(&self.length.to_be_bytes());
        if let Some(parent) = self.parent {
            buf[PARENT_RANGE].copy_from_slice(parent.as_bytes());
        }
        buf
    }

    /// Decodes a footer, validating the magic number.
    ///
    /// The reserved region is not inspected.
    pub fn decode(buf: &[u8; FOOTER_SIZE]) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[MAGIC_RANGE]);
        let magic = u32::from_be_bytes(magic);
        if magic != MAGIC_NUMBER {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Invalid magic number: expected {:08x}, found {:08x}",
                    MAGIC_NUMBER, magic
                ),
            ));
        }

        let mut length = [0u8; 8];
        length.copy_from_slice(&buf[LENGTH_RANGE]);

        let mut parent = [0u8; RecordId::LEN];
        parent.copy_from_slice(&buf[PARENT_RANGE]);

        Ok(Self {
            length: u64::from_be_bytes(length),
            parent: RecordId::from_bytes(parent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_without_parent() {
        let buf = Footer::new(48, None).encode();

        assert_eq!(&buf[0..4], &[0x14, 0x15, 0x92, 0x65]);
        assert_eq!(&buf[4..12], &48u64.to_be_bytes());
        assert!(buf[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_layout_with_parent() {
        let parent = RecordId::mint().unwrap();
        let buf = Footer::new(7, Some(parent)).encode();

        assert_eq!(&buf[12..28], parent.as_bytes());
        assert!(buf[28..].iter().all(|b| *b == 0));

        let decoded = Footer::decode(&buf).unwrap();
        assert_eq!(decoded.length, 7);
        assert_eq!(decoded.parent, Some(parent));
    }

    #[test]
    fn test_zero_parent_decodes_to_none() {
        let decoded = Footer::decode(&Footer::new(0, None).encode()).unwrap();
        assert_eq!(decoded, Footer::new(0, None));
    }

    #[test]
    fn test_every_magic_byte_is_checked() {
        let original = Footer::new(48, None).encode();
        for i in 0..4 {
            let mut buf = original;
            buf[i] ^= 0xFF;
            let err = Footer::decode(&buf).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData);
            assert!(err.to_string().contains("magic"));
        }
    }

    #[test]
    fn test_reserved_region_ignored_on_decode() {
        let mut buf = Footer::new(3, None).encode();
        buf[40] = 0xAB;
        assert_eq!(Footer::decode(&buf).unwrap().length, 3);
    }
}
