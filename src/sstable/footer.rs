//! SSTable footer implementation.
//!
//! The footer is a fixed-size (64 bytes) structure at the end of an SSTable
//! file. It locates the index block and identifies the format.

use crate::config::CompressionType;
use crate::error::{Error, Result};
use crate::sstable::{CURRENT_VERSION, FOOTER_SIZE, MAGIC_NUMBER};
use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// BlockHandle represents a pointer to a block in the SSTable file.
///
/// The offset points at the block's metadata header; the size is the length
/// of the encoded payload that follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHandle {
    /// Offset of the block in the file
    pub offset: u64,
    /// Size of the block payload in bytes
    pub size: u64,
}

impl BlockHandle {
    /// Encoded size of a handle
    pub const ENCODED_SIZE: usize = 16;

    /// Create a new BlockHandle
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Encode the BlockHandle to bytes (16 bytes: 8 for offset + 8 for size)
    pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..16].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decode a BlockHandle from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_SIZE {
            return Err(Error::corruption("BlockHandle too short"));
        }

        Ok(Self { offset: read_u64(&data[0..8]), size: read_u64(&data[8..16]) })
    }

    /// Check if this handle points nowhere (the reserved filter handle)
    pub fn is_null(&self) -> bool {
        self.offset == 0 && self.size == 0
    }
}

/// Footer is the last 64 bytes of an SSTable file.
///
/// Format:
/// ```text
/// [index_handle: 16 bytes]
/// [filter_handle: 16 bytes]   // reserved, always zero
/// [magic: 8 bytes]
/// [version: 4 bytes]
/// [created_at: 8 bytes]       // unix seconds, signed
/// [compression: 1 byte]
/// [padding: 11 bytes]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    /// Handle to the index block
    pub index_handle: BlockHandle,
    /// Handle to the filter block (reserved)
    pub filter_handle: BlockHandle,
    /// Format identifier
    pub magic_number: u64,
    /// Format version
    pub version: u32,
    /// Creation time in unix seconds
    pub created_at: i64,
    /// Compression applied to blocks
    pub compression: CompressionType,
}

impl Footer {
    /// Length of the encoding before padding
    pub const UNPADDED_SIZE: usize = 16 + 16 + 8 + 4 + 8 + 1;

    /// Create a footer for a table created now
    pub fn new(index_handle: BlockHandle, compression: CompressionType) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self {
            index_handle,
            filter_handle: BlockHandle::default(),
            magic_number: MAGIC_NUMBER,
            version: CURRENT_VERSION,
            created_at,
            compression,
        }
    }

    /// Encode the footer fields without padding
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::UNPADDED_SIZE);
        buf.extend_from_slice(&self.index_handle.encode());
        buf.extend_from_slice(&self.filter_handle.encode());
        buf.extend_from_slice(&self.magic_number.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.created_at.to_le_bytes());
        buf.push(self.compression as u8);
        buf
    }

    /// Encode the footer and pad it to exactly [`FOOTER_SIZE`] bytes.
    ///
    /// Fails if the natural encoding does not fit.
    pub fn encode_padded(&self) -> Result<[u8; FOOTER_SIZE]> {
        let encoded = self.encode();
        if encoded.len() > FOOTER_SIZE {
            return Err(Error::internal(format!(
                "Footer encodes to {} bytes, more than {}",
                encoded.len(),
                FOOTER_SIZE
            )));
        }

        let mut buf = [0u8; FOOTER_SIZE];
        buf[..encoded.len()].copy_from_slice(&encoded);
        Ok(buf)
    }

    /// Decode a footer from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FOOTER_SIZE {
            return Err(Error::corruption(format!(
                "Footer size mismatch: expected {}, got {}",
                FOOTER_SIZE,
                data.len()
            )));
        }

        // Verify magic number
        let magic_number = read_u64(&data[32..40]);
        if magic_number != MAGIC_NUMBER {
            return Err(Error::corruption(format!(
                "Invalid SSTable magic number: expected {:#x}, got {:#x}",
                MAGIC_NUMBER, magic_number
            )));
        }

        let index_handle = BlockHandle::decode(&data[0..16])?;
        let filter_handle = BlockHandle::decode(&data[16..32])?;

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[40..44]);
        let created_at = read_u64(&data[44..52]) as i64;
        let compression = CompressionType::from_u8(data[52])
            .ok_or_else(|| Error::corruption(format!("Invalid compression type {}", data[52])))?;

        Ok(Self {
            index_handle,
            filter_handle,
            magic_number,
            version: u32::from_le_bytes(version),
            created_at,
            compression,
        })
    }

    /// Write the padded footer to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode_padded()?)?;
        Ok(())
    }

    /// Read the footer from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; FOOTER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::corruption("Truncated footer"),
            _ => Error::Io(e),
        })?;
        Self::decode(&buf)
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}
