use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Large sequential reads keep hashing of multi-gigabyte sources I/O bound.
const READ_CAPACITY: usize = 4 * 1024 * 1024;

/// BLAKE3 digest of a file's content, as lowercase hex.
pub fn calculate_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_reader(BufReader::with_capacity(READ_CAPACITY, file))
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hasher.finalize().to_hex().to_string())
}

#[must_use]
pub fn calculate_bytes_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
