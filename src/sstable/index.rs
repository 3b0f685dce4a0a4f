//! Index block implementation for SSTable.
//!
//! The index block maps the first key of every data block to the block's
//! location, enabling a binary search for the one block that may hold a key.

use crate::error::{Error, Result};
use crate::sstable::block::{get_length_prefixed, get_u32, get_u64};
use crate::sstable::footer::BlockHandle;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// IndexEntry represents a single entry in the index block.
///
/// Each entry contains:
/// - Key: The first (smallest) key in the corresponding data block
/// - BlockHandle: Location and payload size of the data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The first key in the data block
    pub key: Vec<u8>,
    /// Handle to the data block
    pub handle: BlockHandle,
}

impl IndexEntry {
    /// Create a new IndexEntry
    pub fn new(key: Vec<u8>, handle: BlockHandle) -> Self {
        Self { key, handle }
    }
}

/// IndexBlock holds one entry per data block, in flush order.
///
/// Format:
/// ```text
/// [entry_count: u32]
/// [key_len: u32][key bytes][offset: u64][size: u64]   // repeated
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexBlock {
    entries: Vec<IndexEntry>,
}

impl IndexBlock {
    /// Create an empty index block
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Callers add entries in ascending key order; nothing
    /// is sorted or validated here.
    pub fn add_entry(&mut self, key: &[u8], handle: BlockHandle) {
        self.entries.push(IndexEntry::new(key.to_vec(), handle));
    }

    /// Get the number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in flush order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Position of the data block that may contain `key`.
    ///
    /// Selects the block whose first key is the greatest first key `<= key`.
    /// Keys past the last first key go to the last block; keys before the
    /// first block clamp to block 0. Returns `None` only for an empty index.
    pub fn find_block_index(&self, key: &[u8]) -> Option<usize> {
        let last = self.entries.last()?;
        if key >= last.key.as_slice() {
            return Some(self.entries.len() - 1);
        }

        // First entry whose key is greater than the search key.
        let upper = self.entries.partition_point(|entry| entry.key.as_slice() <= key);
        Some(upper.saturating_sub(1))
    }

    /// Find the block handle for a given key.
    ///
    /// Returns the handle of the data block that may contain the key.
    pub fn find_block(&self, key: &[u8]) -> Option<BlockHandle> {
        self.find_block_index(key).map(|i| self.entries[i].handle)
    }

    /// Length of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        4 + self.entries.iter().map(|e| 4 + e.key.len() + BlockHandle::ENCODED_SIZE).sum::<usize>()
    }

    /// Serialize the index block
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32_le(self.entries.len() as u32);
        for entry in &self.entries {
            buf.put_u32_le(entry.key.len() as u32);
            buf.put_slice(&entry.key);
            buf.put_u64_le(entry.handle.offset);
            buf.put_u64_le(entry.handle.size);
        }
        buf.freeze()
    }

    /// Deserialize an index block payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let count = get_u32(&mut buf, "index entry count")? as usize;

        // Each entry needs at least 20 bytes: key length plus handle.
        let mut entries = Vec::with_capacity(count.min(buf.remaining() / 20));
        for _ in 0..count {
            let key = get_length_prefixed(&mut buf, "index key")?;
            let offset = get_u64(&mut buf, "index block offset")?;
            let size = get_u64(&mut buf, "index block size")?;
            entries.push(IndexEntry::new(key, BlockHandle::new(offset, size)));
        }

        if buf.has_remaining() {
            return Err(Error::corruption(format!(
                "{} trailing bytes after {} index entries",
                buf.remaining(),
                count
            )));
        }

        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index(keys: &[&[u8]]) -> IndexBlock {
        let mut index = IndexBlock::new();
        for (i, key) in keys.iter().enumerate() {
            index.add_entry(key, BlockHandle::new(i as u64 * 100, 80));
        }
        index
    }

    #[test]
    fn test_index_block_empty() {
        let index = IndexBlock::new();
        assert!(index.is_empty());
        assert_eq!(index.find_block(b"anything"), None);
        assert_eq!(&index.encode()[..], &0u32.to_le_bytes());
    }

    #[test]
    fn test_index_encode_layout() {
        let index = build_index(&[b"ab"]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"ab");
        expected.extend_from_slice(&0u64.to_le_bytes());
        expected.extend_from_slice(&80u64.to_le_bytes());

        assert_eq!(&index.encode()[..], &expected[..]);
        assert_eq!(index.encoded_len(), expected.len());
    }

    #[test]
    fn test_index_decode() {
        let index = build_index(&[b"apple", b"banana", b"cherry"]);
        let decoded = IndexBlock::decode(&index.encode()).unwrap();
        assert_eq!(decoded.entries(), index.entries());
    }

    #[test]
    fn test_index_decode_truncated() {
        let data = build_index(&[b"apple", b"banana"]).encode();
        assert!(matches!(IndexBlock::decode(&data[..data.len() - 3]), Err(Error::Corruption(_))));
        assert!(matches!(IndexBlock::decode(&data[..2]), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_index_block_find() {
        let index = build_index(&[b"k1", b"k3", b"k5"]);

        // Exact first keys
        assert_eq!(index.find_block_index(b"k1"), Some(0));
        assert_eq!(index.find_block_index(b"k3"), Some(1));
        assert_eq!(index.find_block_index(b"k5"), Some(2));

        // Key between blocks goes to the earlier block
        assert_eq!(index.find_block_index(b"k2"), Some(0));
        assert_eq!(index.find_block_index(b"k4"), Some(1));

        // Key after all blocks goes to the last block
        assert_eq!(index.find_block_index(b"k9"), Some(2));

        // Key before the first block clamps to block 0
        assert_eq!(index.find_block_index(b"a"), Some(0));
        assert_eq!(index.find_block(b"a"), Some(BlockHandle::new(0, 80)));
    }

    #[test]
    fn test_index_single_entry() {
        let index = build_index(&[b"m"]);
        assert_eq!(index.find_block_index(b"a"), Some(0));
        assert_eq!(index.find_block_index(b"m"), Some(0));
        assert_eq!(index.find_block_index(b"z"), Some(0));
    }
}
