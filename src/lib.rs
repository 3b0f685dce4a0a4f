//! # sstkit - Sorted String Tables for LSM-Tree Storage
//!
//! sstkit implements the immutable on-disk table format used as the durable
//! storage unit of an LSM-tree key-value store, plus the in-memory MemTable
//! that feeds it.
//!
//! ## Architecture
//!
//! - **SSTable writer**: buffers sorted pairs into ~4KB blocks, writes each
//!   block behind a checksummed header, then an index block and a footer
//! - **SSTable reader**: loads the footer and index once, answers point
//!   lookups with a binary search over the index and then one data block
//! - **MemTable**: a pluggable sorted map (skip list or B-tree) that is
//!   drained into a new SSTable on flush
//!
//! Every block is verified with CRC-32 when it is read.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sstkit::sstable::{SSTableReader, SSTableWriter};
//!
//! # fn main() -> Result<(), sstkit::Error> {
//! // Write a table; keys must arrive in ascending order
//! let mut writer = SSTableWriter::open("./data")?;
//! writer.write(b"apple", b"red")?;
//! writer.write(b"banana", b"yellow")?;
//! let path = writer.path().to_path_buf();
//! writer.close()?;
//!
//! // Read it back
//! let reader = SSTableReader::open(&path)?;
//! assert_eq!(reader.get(b"apple")?, b"red".to_vec());
//! assert!(reader.get(b"cherry").unwrap_err().is_not_found());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod memtable;
pub mod sstable;

// Re-exports
pub use config::{CompressionType, MemTableBackend, Options};
pub use error::{Error, Result};
pub use memtable::{MemTable, SortedStore};
pub use sstable::{SSTableReader, SSTableWriter};
