//! Local filesystem helpers for the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::package::ARCHIVE_EXTENSION;

/// Create `dir` (and parents) if missing.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or cannot be
/// created.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        anyhow::bail!("{} exists and is not a directory", dir.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))
}

/// Package archives already present directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn existing_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry.context("reading directory entry")?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ARCHIVE_EXTENSION) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
