//! SSTable reader implementation.
//!
//! Opens a finished SSTable, keeps its index in memory and answers point
//! lookups by reading and verifying one data block per call.

use crate::config::CompressionType;
use crate::error::{Error, Result};
use crate::sstable::block::Block;
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::index::IndexBlock;
use crate::sstable::metadata::{BlockMetadata, BlockType};
use crate::sstable::{checksum, FOOTER_SIZE};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// SSTableReader provides read access to an SSTable file.
///
/// The footer and index block are loaded and verified once at open. Data
/// blocks are not cached: every `get` re-reads and re-verifies its block.
///
/// The file handle has a single cursor, so each block read holds a mutex
/// for its seek and read. A reader can be shared across threads.
///
/// Usage:
/// ```no_run
/// use sstkit::sstable::SSTableReader;
///
/// let reader = SSTableReader::open("table.sst").unwrap();
/// match reader.get(b"key1") {
///     Ok(value) => println!("Found: {:?}", value),
///     Err(e) if e.is_not_found() => println!("Missing"),
///     Err(e) => panic!("{}", e),
/// }
/// ```
#[derive(Debug)]
pub struct SSTableReader {
    file: Mutex<File>,
    path: PathBuf,
    index: IndexBlock,
    footer: Footer,
    file_size: u64,
}

impl SSTableReader {
    /// Open an SSTable file for reading.
    ///
    /// Fails without returning a reader if the footer, the index block
    /// header or the index payload cannot be read and verified.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        // Get file size
        let file_size = file.metadata()?.len();
        if file_size < FOOTER_SIZE as u64 {
            return Err(Error::corruption(format!(
                "File too small to be a valid SSTable: {} bytes",
                file_size
            )));
        }

        // Read footer from the end of the file
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let footer = Footer::read_from(&mut file)?;
        if footer.compression != CompressionType::None {
            return Err(Error::not_implemented(format!(
                "Table compression {:?} is not supported",
                footer.compression
            )));
        }

        // Read index block
        let data_end = file_size - FOOTER_SIZE as u64;
        let index_data = read_block_data(&mut file, &footer.index_handle, BlockType::Index, data_end)?;
        let index = IndexBlock::decode(&index_data.payload)?;
        check_key_count(&index_data.metadata, index.len())?;

        log::info!("Opened SSTable {:?}: {} data blocks, {} bytes", path, index.len(), file_size);

        Ok(Self { file: Mutex::new(file), path, index, footer, file_size })
    }

    /// Get the value for a key.
    ///
    /// Returns `Error::NotFound` if the key is not in the table. A damaged
    /// data block is reported as `Error::ChecksumMismatch` or
    /// `Error::Corruption`, never as a missing key.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        // Find the data block that may contain the key
        let handle = self.index.find_block(key).ok_or_else(|| not_found(key))?;

        let block = self.read_block(&handle)?;
        block.get(key).map(|value| value.to_vec()).ok_or_else(|| not_found(key))
    }

    /// Load, verify and decode the data block at `handle`
    pub fn read_block(&self, handle: &BlockHandle) -> Result<Block> {
        let data_end = self.file_size - FOOTER_SIZE as u64;
        let block_data = {
            let mut file = self.file.lock();
            read_block_data(&mut *file, handle, BlockType::Data, data_end)?
        };

        let block = Block::decode(&block_data.payload)?;
        check_key_count(&block_data.metadata, block.len())?;

        log::debug!(
            "Loaded data block at offset {}: {} entries",
            handle.offset,
            block.len()
        );
        Ok(block)
    }

    /// Release the file handle
    pub fn close(self) -> Result<()> {
        log::debug!("Closing SSTable {:?}", self.path);
        drop(self.file);
        Ok(())
    }

    /// The in-memory index block
    pub fn index(&self) -> &IndexBlock {
        &self.index
    }

    /// The decoded footer
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Get the number of data blocks
    pub fn num_blocks(&self) -> usize {
        self.index.len()
    }

    /// Get the file size
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Path of the table file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A verified block payload and its header
struct BlockData {
    metadata: BlockMetadata,
    payload: Vec<u8>,
}

/// Read the block at `handle`: header, type and size checks, payload, CRC
/// check.
///
/// `data_end` is where the footer starts; a block that would run into it is
/// corrupt.
fn read_block_data<R: Read + Seek>(
    file: &mut R,
    handle: &BlockHandle,
    expected: BlockType,
    data_end: u64,
) -> Result<BlockData> {
    let header_end = handle.offset.checked_add(BlockMetadata::ENCODED_SIZE as u64);
    if header_end.map_or(true, |end| end > data_end) {
        return Err(Error::corruption(format!(
            "Block offset {} is outside the data region ({} bytes)",
            handle.offset, data_end
        )));
    }

    // Seek to block offset
    file.seek(SeekFrom::Start(handle.offset))?;
    let metadata = BlockMetadata::read_from(file)?;

    if metadata.block_type != expected {
        return Err(Error::corruption(format!(
            "Expected {:?} block at offset {}, found {:?}",
            expected, handle.offset, metadata.block_type
        )));
    }
    if metadata.compressed {
        return Err(Error::not_implemented("Compressed blocks are not supported"));
    }
    if handle.size != metadata.size as u64 {
        return Err(Error::corruption(format!(
            "Block handle at offset {} records {} bytes, header declares {}",
            handle.offset, handle.size, metadata.size
        )));
    }

    let payload_end = handle.offset + BlockMetadata::ENCODED_SIZE as u64 + metadata.size as u64;
    if payload_end > data_end {
        return Err(Error::corruption(format!(
            "Block at offset {} declares {} bytes, past the data region",
            handle.offset, metadata.size
        )));
    }

    let mut payload = vec![0u8; metadata.size as usize];
    file.read_exact(&mut payload).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::corruption("Truncated block payload"),
        _ => Error::Io(e),
    })?;

    // Verify checksum
    let actual = checksum(&payload);
    if actual != metadata.crc {
        log::warn!(
            "{:?} block at offset {} failed checksum: expected {:#x}, got {:#x}",
            expected,
            handle.offset,
            metadata.crc,
            actual
        );
        return Err(Error::ChecksumMismatch { expected: metadata.crc, actual });
    }

    Ok(BlockData { metadata, payload })
}

fn check_key_count(metadata: &BlockMetadata, decoded: usize) -> Result<()> {
    if metadata.key_count as usize != decoded {
        return Err(Error::corruption(format!(
            "Block metadata declares {} keys, payload holds {}",
            metadata.key_count, decoded
        )));
    }
    Ok(())
}

fn not_found(key: &[u8]) -> Error {
    Error::not_found(format!("key {:?}", String::from_utf8_lossy(key)))
}
