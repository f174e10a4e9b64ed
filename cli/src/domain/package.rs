//! Resolution request and result types, plus the pure helpers around them.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::FetchError;

/// Extension of the package manager's installable archive files.
pub const ARCHIVE_EXTENSION: &str = "deb";

/// User-selected resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Print-URIs first, dependency expansion on failure.
    #[default]
    Auto,
    /// Print-URIs only.
    Uris,
    /// Dependency expansion only.
    Rdepends,
}

pub const VALID_MODES: &[&str] = &["auto", "uris", "rdepends"];

impl FromStr for ResolveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "uris" => Ok(Self::Uris),
            "rdepends" => Ok(Self::Rdepends),
            other => Err(format!(
                "unknown method '{other}' (valid: {})",
                VALID_MODES.join(", ")
            )),
        }
    }
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Uris => "uris",
            Self::Rdepends => "rdepends",
        })
    }
}

/// Which strategy produced (or failed to produce) a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrategyKind {
    #[serde(rename = "print-uris")]
    PrintUris,
    #[serde(rename = "apt-rdepends")]
    AptRdepends,
    #[serde(rename = "apt-cache-depends")]
    AptCacheDepends,
}

impl StrategyKind {
    /// Human-readable label used in progress output and the final summary.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PrintUris => "print-uris",
            Self::AptRdepends => "apt-rdepends + apt-get download",
            Self::AptCacheDepends => "apt-cache depends + apt-get download",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target package plus names to drop from an expanded dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub package: String,
    pub excludes: Vec<String>,
}

impl ResolutionRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` if `package` is not a usable package name.
    pub fn new(package: impl Into<String>, excludes: Vec<String>) -> Result<Self, FetchError> {
        let package = package.into();
        validate_package_name(&package)?;
        Ok(Self { package, excludes })
    }
}

/// Output of a successful resolution: never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Uris(Vec<String>),
    Packages(Vec<String>),
}

impl ResolutionResult {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Uris(v) | Self::Packages(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reject names apt would misread or that could never name a package.
///
/// # Errors
///
/// Returns `InvalidInput` for empty names, names with whitespace or control
/// characters, and names starting with `-`.
pub fn validate_package_name(name: &str) -> Result<(), FetchError> {
    if name.is_empty() {
        return Err(FetchError::InvalidInput("package name is empty".to_string()));
    }
    if name.starts_with('-') {
        return Err(FetchError::InvalidInput(format!(
            "package name '{name}' must not start with '-'"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(FetchError::InvalidInput(format!(
            "package name {name:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}

/// Drop every name in `excludes` from `packages`, keeping order.
#[must_use]
pub fn apply_excludes(packages: Vec<String>, excludes: &[String]) -> Vec<String> {
    if excludes.is_empty() {
        return packages;
    }
    let skip: HashSet<&str> = excludes.iter().map(String::as_str).collect();
    packages
        .into_iter()
        .filter(|p| !skip.contains(p.as_str()))
        .collect()
}

/// Deduplicate keeping the first occurrence of each name.
#[must_use]
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// A downloaded archive on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub remote_path: String,
}

impl DownloadedArtifact {
    /// Accept `remote_path` only if it names an archive file.
    #[must_use]
    pub fn from_remote_path(remote_path: &str) -> Option<Self> {
        let path = Path::new(remote_path);
        let is_archive = path
            .extension()
            .is_some_and(|ext| ext == ARCHIVE_EXTENSION);
        (is_archive && path.file_name().is_some()).then(|| Self {
            remote_path: remote_path.to_string(),
        })
    }

    /// Remote base filename.
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&self.remote_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.remote_path)
    }

    /// Destination directly inside `local_dir`, named by the remote base name.
    #[must_use]
    pub fn local_destination(&self, local_dir: &Path) -> PathBuf {
        local_dir.join(self.file_name())
    }
}

/// Base name of a download URI, used when the downloader needs an explicit
/// output filename.
#[must_use]
pub fn uri_basename(uri: &str) -> &str {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.rsplit('/').next().unwrap_or(path)
}
