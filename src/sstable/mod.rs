//! SSTable (Sorted String Table) implementation.
//!
//! SSTable is an immutable, sorted file format for storing key-value pairs.
//! A table is written once by a [`SSTableWriter`] and then served by any
//! number of [`SSTableReader`]s.
//!
//! ## File Format
//!
//! ```text
//! [BlockMetadata][Data Block 1]
//! [BlockMetadata][Data Block 2]
//! ...
//! [BlockMetadata][Data Block N]
//! [BlockMetadata][Index Block]   // first key + handle of every data block
//! [Footer: 64B]                  // points to the index block
//! ```
//!
//! Every block is preceded by a 14-byte [`BlockMetadata`] header carrying the
//! block type, payload length, entry count and the CRC-32 of the payload.
//!
//! ## Block Format
//!
//! ```text
//! [entry_count: u32]
//! [key_len: u32][key][value_len: u32][value]   // repeated entry_count times
//! ```
//!
//! ## Index Format
//!
//! Same framing as a data block, with the value replaced by a [`BlockHandle`]:
//! - Key: The first (smallest) key in the data block
//! - Offset: File offset of the block's metadata header
//! - Size: Encoded payload size in bytes
//!
//! All integers are little-endian.

pub mod block;
pub mod footer;
pub mod index;
pub mod metadata;
pub mod reader;
pub mod writer;

pub use block::{Block, Entry};
pub use footer::{BlockHandle, Footer};
pub use index::{IndexBlock, IndexEntry};
pub use metadata::{BlockMetadata, BlockType};
pub use reader::SSTableReader;
pub use writer::SSTableWriter;

// Re-export CompressionType from config
pub use crate::config::CompressionType;

/// Default data block size threshold (4KB)
pub const BLOCK_SIZE: usize = 4096;

/// Footer size in bytes (fixed)
pub const FOOTER_SIZE: usize = 64;

/// Magic number for SSTable files
pub const MAGIC_NUMBER: u64 = 0x8773_5374_6162_6c65;

/// Format version written into the footer
pub const CURRENT_VERSION: u32 = 1;

/// File name prefix for tables created with [`SSTableWriter::open`]
pub const SSTABLE_FILE_PREFIX: &str = "sstable_";

/// File extension for table files
pub const SSTABLE_FILE_EXTENSION: &str = "sst";

/// CRC-32 (IEEE) of a block payload.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
