//! # MemTable - In-Memory Sorted Table
//!
//! The MemTable stages recent writes in memory and drains them, in key
//! order, into a new SSTable when flushed.
//!
//! ## Design
//!
//! - The sorted map behind a MemTable is pluggable through [`SortedStore`]
//! - Two backends ship with the crate: [`SkipListStore`] and [`BTreeStore`]
//! - Values are always plain byte vectors
//! - Size is tracked to let callers decide when to flush
//!
//! ## Thread Safety
//!
//! Stores handle their own concurrency. The MemTable additionally serializes
//! writers so size accounting stays exact; reads go straight to the store.

mod btree;
mod skiplist;

pub use btree::BTreeStore;
pub use skiplist::SkipListStore;

use crate::config::{MemTableBackend, Options};
use crate::error::Result;
use crate::sstable::SSTableWriter;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// An ordered string-keyed map holding the latest value for each key.
///
/// Implementations must be safe to share between threads and must return
/// entries in ascending byte order of their keys.
pub trait SortedStore: Send + Sync {
    /// Insert or replace the value for `key`.
    fn set(&self, key: &str, value: Vec<u8>);

    /// Latest value for `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Number of distinct keys.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A stable snapshot of all entries in ascending key order.
    fn sorted_entries(&self) -> Vec<(String, Vec<u8>)>;
}

/// Create an empty store of the given kind
pub fn new_store(backend: MemTableBackend) -> Box<dyn SortedStore> {
    match backend {
        MemTableBackend::SkipList => Box::new(SkipListStore::new()),
        MemTableBackend::BTree => Box::new(BTreeStore::new()),
    }
}

/// MemTable stores recent writes in memory.
///
/// # Example
///
/// ```rust
/// use sstkit::config::MemTableBackend;
/// use sstkit::memtable::MemTable;
///
/// let memtable = MemTable::new(MemTableBackend::SkipList);
/// memtable.put("key1", b"value1");
/// assert_eq!(memtable.get("key1"), Some(b"value1".to_vec()));
/// ```
pub struct MemTable {
    store: Box<dyn SortedStore>,
    write_lock: Mutex<()>,
    /// Sum of the lengths of the current values
    size: AtomicUsize,
}

impl MemTable {
    /// Creates a new empty MemTable backed by `backend`.
    pub fn new(backend: MemTableBackend) -> Self {
        Self::with_store(new_store(backend))
    }

    /// Creates a MemTable over a caller-supplied store.
    ///
    /// The store is expected to be empty.
    pub fn with_store(store: Box<dyn SortedStore>) -> Self {
        Self { store, write_lock: Mutex::new(()), size: AtomicUsize::new(0) }
    }

    /// Inserts or replaces the value for a key.
    pub fn put(&self, key: &str, value: &[u8]) {
        let _guard = self.write_lock.lock();

        if let Some(existing) = self.store.get(key) {
            self.size.fetch_sub(existing.len(), Ordering::Relaxed);
        }
        self.store.set(key, value.to_vec());
        self.size.fetch_add(value.len(), Ordering::Relaxed);
    }

    /// Retrieves the latest value for a key.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get(key)
    }

    /// Returns the number of distinct keys in the MemTable.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the MemTable contains no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the total size of the stored values in bytes.
    pub fn approximate_size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Writes every entry, in key order, to a new SSTable in `dir`.
    ///
    /// Returns the path of the finished table. If writing fails the partial
    /// file is removed.
    pub fn flush<P: AsRef<Path>>(&self, dir: P, options: &Options) -> Result<PathBuf> {
        let entries = self.store.sorted_entries();
        let mut writer = SSTableWriter::open_with_options(dir, options)?;
        let path = writer.path().to_path_buf();

        log::info!("Starting flush of {} MemTable entries to {:?}", entries.len(), path);

        let result = entries
            .iter()
            .try_for_each(|(key, value)| writer.write(key.as_bytes(), value))
            .and_then(|()| writer.close());

        match result {
            Ok(file_size) => {
                log::info!("Flushed MemTable to {:?}: {} bytes", path, file_size);
                Ok(path)
            }
            Err(e) => {
                log::warn!("MemTable flush to {:?} failed: {}", path, e);
                if let Err(remove_err) = fs::remove_file(&path) {
                    log::warn!("Failed to remove partial table {:?}: {}", path, remove_err);
                }
                Err(e)
            }
        }
    }
}
