//! File output helpers
//!
//! Atomic writes via tempfile + rename, plus the content hashing `check`
//! uses for stale-output detection.

use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::MetastripResult;

/// Write content to a file atomically.
///
/// The content lands in a temp file in the destination directory, then a
/// rename swaps it into place, so readers never observe a half-written file.
pub fn atomic_write(path: &Path, content: &[u8]) -> MetastripResult<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// SHA-256 of a content buffer, formatted `sha256:<hex>`
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{:x}", hasher.finalize())
}

/// SHA-256 of a file on disk
pub fn hash_file(path: &Path) -> MetastripResult<String> {
    let content = std::fs::read(path)?;
    Ok(hash_content(&content))
}
