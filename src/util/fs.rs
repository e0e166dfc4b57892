//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Recursively find header files with the given extension under the
/// listed directories. Sorted and deduplicated, so downstream stages see
/// the same sequence regardless of directory iteration order.
pub fn discover_headers(dirs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for dir in dirs {
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry =
                entry.with_context(|| format!("failed to walk directory: {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                results.push(path.to_path_buf());
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a file atomically: the contents land in a temporary file next
/// to the destination and are persisted into place in one rename, so a
/// failed run never leaves partial output at the final location.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ensure_dir(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    std::io::Write::write_all(&mut tmp, contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to move output into place: {}", path.display()))?;
    Ok(())
}
