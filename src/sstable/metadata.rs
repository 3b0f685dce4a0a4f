//! Block metadata header.
//!
//! Every block payload on disk is preceded by a fixed 14-byte header that
//! says what kind of block follows, how long it is and what its CRC-32 is.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Kind of block that follows a metadata header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockType {
    /// Sorted key-value entries
    Data = 0,
    /// First-key to block-handle entries
    Index = 1,
}

impl BlockType {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BlockType::Data),
            1 => Some(BlockType::Index),
            _ => None,
        }
    }
}

/// BlockMetadata precedes every block payload in the file.
///
/// Format:
/// ```text
/// [type: u8]
/// [crc: u32]         // CRC-32 (IEEE) of the payload
/// [size: u32]        // payload length in bytes
/// [key_count: u32]   // number of entries in the payload
/// [compressed: u8]   // 0 or 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMetadata {
    /// Block kind
    pub block_type: BlockType,
    /// Checksum of the payload
    pub crc: u32,
    /// Payload length in bytes
    pub size: u32,
    /// Number of entries encoded in the payload
    pub key_count: u32,
    /// Whether the payload is compressed
    pub compressed: bool,
}

impl BlockMetadata {
    /// Encoded size of the header
    pub const ENCODED_SIZE: usize = 14;

    /// Build the header for an uncompressed payload.
    ///
    /// Fails if the payload length or the entry count does not fit the
    /// header's `u32` fields.
    pub fn for_payload(block_type: BlockType, payload: &[u8], key_count: usize) -> Result<Self> {
        Ok(Self {
            block_type,
            crc: crate::sstable::checksum(payload),
            size: payload_len(payload.len())?,
            key_count: u32::try_from(key_count).map_err(|_| {
                Error::invalid_argument(format!("Block holds {} entries, more than u32::MAX", key_count))
            })?,
            compressed: false,
        })
    }

    /// Encode the header
    pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0] = self.block_type as u8;
        buf[1..5].copy_from_slice(&self.crc.to_le_bytes());
        buf[5..9].copy_from_slice(&self.size.to_le_bytes());
        buf[9..13].copy_from_slice(&self.key_count.to_le_bytes());
        buf[13] = self.compressed as u8;
        buf
    }

    /// Decode a header
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_SIZE {
            return Err(Error::corruption(format!(
                "Block metadata too short: expected {}, got {}",
                Self::ENCODED_SIZE,
                data.len()
            )));
        }

        let block_type = BlockType::from_u8(data[0])
            .ok_or_else(|| Error::corruption(format!("Invalid block type {}", data[0])))?;
        let compressed = match data[13] {
            0 => false,
            1 => true,
            other => {
                return Err(Error::corruption(format!("Invalid compressed flag {}", other)));
            }
        };

        Ok(Self {
            block_type,
            crc: read_u32(&data[1..5]),
            size: read_u32(&data[5..9]),
            key_count: read_u32(&data[9..13]),
            compressed,
        })
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    /// Read a header from a reader.
    ///
    /// A short read is a format error, not an I/O error: the file ended where
    /// a header was expected.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::corruption("Truncated block metadata"),
            _ => Error::Io(e),
        })?;
        Self::decode(&buf)
    }
}

/// Check that an encoded payload length fits the header's `size` field
pub(crate) fn payload_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Error::invalid_argument(format!("Block payload of {} bytes exceeds u32::MAX", len))
    })
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}
