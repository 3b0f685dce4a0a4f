//! Data block implementation for SSTable.
//!
//! A block buffers sorted key-value entries in memory until it is full, and
//! is then encoded and written to disk as one checksummed unit.

use crate::error::{Error, Result};
use crate::sstable::BLOCK_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A single key-value pair stored in a data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The key
    pub key: Vec<u8>,
    /// The value (may be empty)
    pub value: Vec<u8>,
}

impl Entry {
    /// Create a new Entry
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// Block stores key-value pairs in the order they were added.
///
/// Format:
/// ```text
/// [entry_count: u32]
/// [key_len: u32][key bytes][value_len: u32][value bytes]   // entry 1
/// ...
/// [key_len: u32][key bytes][value_len: u32][value bytes]   // entry N
/// ```
///
/// The block tracks the sum of its key and value lengths (framing excluded)
/// and reports itself full once that sum reaches the threshold. The threshold
/// is soft: it is checked before an entry is added, so a single large entry
/// may push the block past it.
#[derive(Debug, Clone)]
pub struct Block {
    entries: Vec<Entry>,
    size: usize,
    threshold: usize,
}

impl Block {
    /// Create an empty block with the default 4KB threshold
    pub fn new() -> Self {
        Self::with_threshold(BLOCK_SIZE)
    }

    /// Create an empty block that is full once `threshold` key+value bytes
    /// have been added
    pub fn with_threshold(threshold: usize) -> Self {
        Self { entries: Vec::new(), size: 0, threshold }
    }

    /// Append an entry. No ordering or length validation is performed.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        self.size += key.len() + value.len();
        self.entries.push(Entry::new(key.to_vec(), value.to_vec()));
    }

    /// Check if the accumulated key+value size has reached the threshold
    pub fn is_full(&self) -> bool {
        self.size >= self.threshold
    }

    /// Check if the block has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in the block
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Accumulated key+value bytes, without framing overhead
    pub fn size(&self) -> usize {
        self.size
    }

    /// The first key added to the block
    pub fn first_key(&self) -> Option<&[u8]> {
        self.entries.first().map(|e| e.key.as_slice())
    }

    /// The entries in append order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Length of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        4 + self.size + self.entries.len() * 8
    }

    /// Serialize the block
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32_le(self.entries.len() as u32);
        for entry in &self.entries {
            buf.put_u32_le(entry.key.len() as u32);
            buf.put_slice(&entry.key);
            buf.put_u32_le(entry.value.len() as u32);
            buf.put_slice(&entry.value);
        }
        buf.freeze()
    }

    /// Deserialize a block payload.
    ///
    /// Fails if any declared length runs past the end of the buffer or if
    /// bytes are left over after the last entry.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let count = get_u32(&mut buf, "block entry count")? as usize;

        // Each entry needs at least 8 bytes of length prefixes.
        let mut entries = Vec::with_capacity(count.min(buf.remaining() / 8));
        let mut size = 0;
        for _ in 0..count {
            let key = get_length_prefixed(&mut buf, "block key")?;
            let value = get_length_prefixed(&mut buf, "block value")?;
            size += key.len() + value.len();
            entries.push(Entry::new(key, value));
        }

        if buf.has_remaining() {
            return Err(Error::corruption(format!(
                "{} trailing bytes after {} block entries",
                buf.remaining(),
                count
            )));
        }

        Ok(Self { entries, size, threshold: BLOCK_SIZE })
    }

    /// Binary search for an exact key match.
    ///
    /// Entries must be sorted ascending, which holds for every block written
    /// by a writer that was fed sorted keys.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .binary_search_by(|entry| entry.key.as_slice().cmp(key))
            .ok()
            .map(|i| self.entries[i].value.as_slice())
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a little-endian u32, failing on a short buffer
pub(crate) fn get_u32(buf: &mut &[u8], what: &str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::corruption(format!("truncated {}", what)));
    }
    Ok(buf.get_u32_le())
}

/// Read a little-endian u64, failing on a short buffer
pub(crate) fn get_u64(buf: &mut &[u8], what: &str) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(Error::corruption(format!("truncated {}", what)));
    }
    Ok(buf.get_u64_le())
}

/// Read a u32 length followed by that many bytes
pub(crate) fn get_length_prefixed(buf: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    let len = get_u32(buf, what)? as usize;
    if buf.remaining() < len {
        return Err(Error::corruption(format!(
            "{} declares {} bytes but only {} remain",
            what,
            len,
            buf.remaining()
        )));
    }
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}
