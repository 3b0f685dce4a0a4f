//! SSTable writer implementation.
//!
//! Builds an SSTable file from a sequence of sorted key-value pairs.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::sstable::block::Block;
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::index::IndexBlock;
use crate::sstable::metadata::{payload_len, BlockMetadata, BlockType};
use crate::sstable::{SSTABLE_FILE_EXTENSION, SSTABLE_FILE_PREFIX};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Disambiguates tables created within the same clock tick.
static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Attempts at finding an unused file name before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// SSTableWriter writes one SSTable file.
///
/// Keys must be written in ascending order. The writer does not check this;
/// a table written out of order has an index that cannot find its keys.
///
/// Usage:
/// ```no_run
/// use sstkit::sstable::SSTableWriter;
///
/// let mut writer = SSTableWriter::open("./data").unwrap();
/// writer.write(b"key1", b"value1").unwrap();
/// writer.write(b"key2", b"value2").unwrap();
/// let path = writer.path().to_path_buf();
/// writer.close().unwrap();
/// ```
pub struct SSTableWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    block: Block,
    index: IndexBlock,
    offset: u64,
    num_entries: u64,
    options: Options,
}

impl SSTableWriter {
    /// Create a new, uniquely named table in `dir` with default options
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with_options(dir, &Options::default())
    }

    /// Create a new, uniquely named table in `dir`.
    ///
    /// The name is derived from the current time plus a process-wide counter,
    /// and the file is created exclusively so an existing table is never
    /// reused.
    pub fn open_with_options<P: AsRef<Path>>(dir: P, options: &Options) -> Result<Self> {
        options.validate()?;
        let dir = dir.as_ref();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(Self::next_file_name());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok(Self::from_file(file, path, options)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free table file name in {:?}", dir),
        )))
    }

    /// Create a table at an explicit path with default options
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_options(path, &Options::default())
    }

    /// Create a table at an explicit path. Fails if the file already exists.
    pub fn create_with_options<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(Self::from_file(file, path, options))
    }

    fn from_file(file: File, path: PathBuf, options: &Options) -> Self {
        log::debug!("Creating SSTable {:?}", path);
        Self {
            writer: BufWriter::new(file),
            path,
            block: Block::with_threshold(options.block_size),
            index: IndexBlock::new(),
            offset: 0,
            num_entries: 0,
            options: options.clone(),
        }
    }

    fn next_file_name() -> String {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        let seq = FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{}{}_{}.{}", SSTABLE_FILE_PREFIX, nanos, seq, SSTABLE_FILE_EXTENSION)
    }

    /// Add a key-value pair to the table.
    ///
    /// If the current block is already full it is flushed first, so the pair
    /// always lands in a block that was not full when the call started.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.block.is_full() {
            self.flush_block()?;
        }

        // The block payload, with this entry, must fit the header's u32 size
        let grown = self
            .block
            .encoded_len()
            .saturating_add(8)
            .saturating_add(key.len())
            .saturating_add(value.len());
        payload_len(grown)?;

        self.block.add(key, value);
        self.num_entries += 1;
        Ok(())
    }

    /// Write the current data block and record it in the index
    fn flush_block(&mut self) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }

        let block = std::mem::replace(&mut self.block, Block::with_threshold(self.options.block_size));
        let payload = block.encode();
        let metadata = BlockMetadata::for_payload(BlockType::Data, &payload, block.len())?;

        // The handle records the encoded payload length, not the raw
        // key+value sum tracked by the block.
        let handle = BlockHandle::new(self.offset, payload.len() as u64);
        if let Some(first_key) = block.first_key() {
            self.index.add_entry(first_key, handle);
        }

        metadata.write_to(&mut self.writer)?;
        self.writer.write_all(&payload)?;

        self.offset += payload.len() as u64 + BlockMetadata::ENCODED_SIZE as u64;

        log::debug!(
            "Flushed data block #{} at offset {}: {} entries, {} bytes",
            self.index.len(),
            handle.offset,
            block.len(),
            payload.len()
        );
        Ok(())
    }

    /// Finish the table.
    ///
    /// Writes any pending data block, the index block and the footer, then
    /// flushes and closes the file. Returns the total file size.
    ///
    /// If this fails the file is incomplete and must not be opened.
    pub fn close(mut self) -> Result<u64> {
        // Flush any remaining data block
        self.flush_block()?;

        // Write index block
        let index_offset = self.offset;
        let index_data = self.index.encode();
        let index_metadata = BlockMetadata::for_payload(BlockType::Index, &index_data, self.index.len())?;
        index_metadata.write_to(&mut self.writer)?;
        self.writer.write_all(&index_data)?;
        self.offset += index_data.len() as u64 + BlockMetadata::ENCODED_SIZE as u64;

        // Write footer
        let index_handle = BlockHandle::new(index_offset, index_data.len() as u64);
        let footer = Footer::new(index_handle, self.options.compression);
        footer.write_to(&mut self.writer)?;
        let total_size = self.offset + crate::sstable::FOOTER_SIZE as u64;

        // Flush to disk
        let file = self.writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        if self.options.sync_on_close {
            file.sync_all()?;
        }
        drop(file);

        log::info!(
            "Finished SSTable {:?}: {} entries in {} data blocks, {} bytes",
            self.path,
            self.num_entries,
            self.index.len(),
            total_size
        );
        Ok(total_size)
    }

    /// Path of the table being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the number of entries added
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Number of data blocks flushed so far
    pub fn num_blocks(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sstable::{BLOCK_SIZE, FOOTER_SIZE};
    use std::fs;
    use tempfile::TempDir;

    fn read_metadata(data: &[u8], offset: usize) -> BlockMetadata {
        BlockMetadata::decode(&data[offset..offset + BlockMetadata::ENCODED_SIZE]).unwrap()
    }

    #[test]
    fn test_writer_open_unique_names() {
        let dir = TempDir::new().unwrap();
        let first = SSTableWriter::open(dir.path()).unwrap();
        let second = SSTableWriter::open(dir.path()).unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(dir.path()));
        let name = first.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(SSTABLE_FILE_PREFIX));
        assert!(name.ends_with(".sst"));
    }

    #[test]
    fn test_writer_open_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = SSTableWriter::open(dir.path().join("missing"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_writer_create_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.sst");
        fs::write(&path, b"occupied").unwrap();

        assert!(matches!(SSTableWriter::create(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_writer_rejects_compression() {
        let dir = TempDir::new().unwrap();
        let options = Options::default().compression(crate::config::CompressionType::Snappy);
        let result = SSTableWriter::open_with_options(dir.path(), &options);
        assert!(matches!(result, Err(Error::NotImplemented(_))));
    }

    #[test]
    fn test_writer_single_block_layout() {
        let dir = TempDir::new().unwrap();
        let mut writer = SSTableWriter::open(dir.path()).unwrap();
        writer.write(b"key1", b"value1").unwrap();
        writer.write(b"key2", b"value2").unwrap();
        writer.write(b"key3", b"value3").unwrap();
        assert_eq!(writer.num_entries(), 3);

        let path = writer.path().to_path_buf();
        let size = writer.close().unwrap();
        let data = fs::read(&path).unwrap();
        assert_eq!(size, data.len() as u64);

        // First data block starts at offset 0
        let meta = read_metadata(&data, 0);
        assert_eq!(meta.block_type, BlockType::Data);
        assert_eq!(meta.key_count, 3);
        assert!(!meta.compressed);

        let start = BlockMetadata::ENCODED_SIZE;
        let payload = &data[start..start + meta.size as usize];
        assert_eq!(meta.crc, crc32fast::hash(payload));
        let block = Block::decode(payload).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block.get(b"key2"), Some(&b"value2"[..]));

        // Footer points at the index block right after the data block
        let footer = Footer::decode(&data[data.len() - FOOTER_SIZE..]).unwrap();
        assert_eq!(footer.index_handle.offset, (start + payload.len()) as u64);

        let index_meta = read_metadata(&data, footer.index_handle.offset as usize);
        assert_eq!(index_meta.block_type, BlockType::Index);
        assert_eq!(index_meta.key_count, 1);
        assert_eq!(index_meta.size as u64, footer.index_handle.size);
    }

    #[test]
    fn test_writer_empty_table() {
        let dir = TempDir::new().unwrap();
        let writer = SSTableWriter::open(dir.path()).unwrap();
        let path = writer.path().to_path_buf();
        let size = writer.close().unwrap();

        // Index header + empty index payload + footer
        assert_eq!(size, (BlockMetadata::ENCODED_SIZE + 4 + FOOTER_SIZE) as u64);
        assert_eq!(fs::metadata(&path).unwrap().len(), size);
    }

    #[test]
    fn test_writer_block_boundary() {
        let dir = TempDir::new().unwrap();
        let mut writer = SSTableWriter::open(dir.path()).unwrap();

        let large_value = vec![b'v'; BLOCK_SIZE - 100];
        writer.write(b"key1", &large_value).unwrap();
        writer.write(b"key2", b"small value").unwrap();
        // Block now holds more than BLOCK_SIZE - 100 + 15 bytes but is still
        // under the threshold, so key3 joins it and makes it full.
        writer.write(b"key3", &large_value).unwrap();
        assert_eq!(writer.num_blocks(), 0);

        writer.write(b"key4", b"").unwrap();
        assert_eq!(writer.num_blocks(), 1);

        let path = writer.path().to_path_buf();
        writer.close().unwrap();

        let data = fs::read(&path).unwrap();
        let first = read_metadata(&data, 0);
        assert_eq!(first.key_count, 3);

        let second_offset = BlockMetadata::ENCODED_SIZE + first.size as usize;
        let second = read_metadata(&data, second_offset);
        assert_eq!(second.block_type, BlockType::Data);
        assert_eq!(second.key_count, 1);
    }

    #[test]
    fn test_writer_index_handles_use_encoded_size() {
        let dir = TempDir::new().unwrap();
        let options = Options::default().block_size(64).sync_on_close(false);
        let mut writer = SSTableWriter::open_with_options(dir.path(), &options).unwrap();
        for i in 0..50 {
            let key = format!("key{:04}", i);
            writer.write(key.as_bytes(), b"0123456789").unwrap();
        }
        let path = writer.path().to_path_buf();
        writer.close().unwrap();

        let data = fs::read(&path).unwrap();
        let footer = Footer::decode(&data[data.len() - FOOTER_SIZE..]).unwrap();
        let start = footer.index_handle.offset as usize + BlockMetadata::ENCODED_SIZE;
        let index = IndexBlock::decode(&data[start..start + footer.index_handle.size as usize])
            .unwrap();
        assert!(index.len() > 1);

        for entry in index.entries() {
            let meta = read_metadata(&data, entry.handle.offset as usize);
            assert_eq!(meta.size as u64, entry.handle.size);
        }

        // Handles are contiguous: each block starts where the previous ended.
        for pair in index.entries().windows(2) {
            let end = pair[0].handle.offset + BlockMetadata::ENCODED_SIZE as u64 + pair[0].handle.size;
            assert_eq!(pair[1].handle.offset, end);
            assert!(pair[0].key < pair[1].key);
        }
    }
}
