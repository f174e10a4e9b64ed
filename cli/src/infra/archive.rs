//! Bundles fetched packages into a single `.tar.gz` for offline transport.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;

/// `<package>-<UTC timestamp>.tar.gz`.
#[must_use]
pub fn archive_name(package: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.tar.gz", file_stem(package), at.format("%Y%m%dT%H%M%SZ"))
}

/// `package` made safe as a single path component. apt accepts
/// `name/release` and `name:arch`, neither of which may leak into a path.
fn file_stem(package: &str) -> String {
    package
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Write `files` into `<out_dir>/<archive_name>`, each stored as
/// `<package>/<file name>`. Returns the archive path.
///
/// # Errors
///
/// Returns an error if any file cannot be read or the archive cannot be
/// written.
pub fn bundle(
    out_dir: &Path,
    package: &str,
    files: &[PathBuf],
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    let path = out_dir.join(archive_name(package, at));
    let prefix = file_stem(package);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for source in files {
        let name = source
            .file_name()
            .with_context(|| format!("{} has no file name", source.display()))?;
        let entry = Path::new(&prefix).join(name);
        builder
            .append_path_with_name(source, &entry)
            .with_context(|| format!("adding {} to archive", source.display()))?;
    }

    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .with_context(|| format!("finishing {}", path.display()))?;
    tracing::debug!(path = %path.display(), entries = files.len(), "archive written");
    Ok(path)
}
