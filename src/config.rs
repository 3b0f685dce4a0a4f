//! Configuration options for sstkit.

use crate::sstable::BLOCK_SIZE;

/// Options controlling how tables are written and how MemTables are backed.
#[derive(Debug, Clone)]
pub struct Options {
    /// Accumulated key+value bytes at which a data block counts as full.
    /// Default: 4KB
    pub block_size: usize,

    /// Compression algorithm recorded in the footer.
    /// Only `CompressionType::None` is implemented.
    /// Default: CompressionType::None
    pub compression: CompressionType,

    /// Fsync the table file before `close` returns.
    /// Default: true
    pub sync_on_close: bool,

    /// Sorted map implementation used by new MemTables.
    /// Default: MemTableBackend::SkipList
    pub memtable_backend: MemTableBackend,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            compression: CompressionType::None,
            sync_on_close: true,
            memtable_backend: MemTableBackend::SkipList,
        }
    }
}

/// Compression algorithms declared by the table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// No compression.
    #[default]
    None = 0,

    /// Snappy compression. Reserved, not implemented.
    Snappy = 1,

    /// LZ4 compression. Reserved, not implemented.
    Lz4 = 2,
}

impl CompressionType {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Snappy),
            2 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Sorted map implementations available to a MemTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemTableBackend {
    /// Lock-free skip list (`crossbeam-skiplist`).
    #[default]
    SkipList,

    /// Balanced tree (`BTreeMap`) behind a read-write lock.
    BTree,
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data block size threshold.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the compression algorithm.
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Sets whether the table is fsynced on close.
    pub fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Sets the MemTable backend.
    pub fn memtable_backend(mut self, backend: MemTableBackend) -> Self {
        self.memtable_backend = backend;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if u32::try_from(self.block_size).is_err() {
            return Err(crate::Error::invalid_argument("block_size must fit in a u32"));
        }
        if self.compression != CompressionType::None {
            return Err(crate::Error::not_implemented(format!(
                "compression {:?} is not supported",
                self.compression
            )));
        }
        Ok(())
    }
}
