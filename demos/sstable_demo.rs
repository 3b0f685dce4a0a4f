//! Example demonstrating SSTable usage.
//!
//! This example shows how to:
//! - Stage entries in a MemTable
//! - Flush them into an SSTable
//! - Look keys up with an SSTableReader

use sstkit::sstable::SSTableReader;
use sstkit::{MemTable, Options, Result};

fn main() -> Result<()> {
    env_logger::init();

    println!("=== SSTable Example ===\n");

    let temp_dir = std::env::temp_dir().join(format!("sstkit_demo_{}", std::process::id()));
    std::fs::create_dir_all(&temp_dir)?;

    let entries = [
        ("apple", "red fruit"),
        ("banana", "yellow fruit"),
        ("cherry", "small red fruit"),
        ("date", "sweet dried fruit"),
        ("elderberry", "small black berry"),
    ];

    // === Part 1: Writing an SSTable ===
    println!("1. Writing data to an SSTable...");
    let options = Options::default();
    let memtable = MemTable::new(options.memtable_backend);
    for (key, value) in &entries {
        memtable.put(key, value.as_bytes());
        println!("   Wrote: {} -> {}", key, value);
    }
    let path = memtable.flush(&temp_dir, &options)?;
    println!("   ✓ SSTable created: {}\n", path.display());

    // === Part 2: Reading from the SSTable ===
    println!("2. Reading data from the SSTable...");
    let reader = SSTableReader::open(&path)?;
    println!("   File size: {} bytes", reader.file_size());
    println!("   Number of blocks: {}\n", reader.num_blocks());

    for (key, expected) in &entries {
        let value = reader.get(key.as_bytes())?;
        assert_eq!(value, expected.as_bytes(), "value mismatch for {}", key);
        println!("   Read: {} -> {}", key, String::from_utf8_lossy(&value));
    }

    match reader.get(b"mango") {
        Ok(_) => println!("   'mango' unexpectedly present"),
        Err(e) if e.is_not_found() => println!("   'mango' -> NOT FOUND"),
        Err(e) => return Err(e),
    }
    reader.close()?;

    std::fs::remove_dir_all(&temp_dir)?;
    println!("\n=== Example Complete ===");
    Ok(())
}
