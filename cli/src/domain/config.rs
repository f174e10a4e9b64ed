//! Domain types for debfetch configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::package::ResolveMode;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_OUT_DIR: &str = "./deb_pkgs";

// ── Config schema ────────────────────────────────────────────────────────────

/// Defaults read from `config.yaml`. Every field is optional in the file and
/// every value can be overridden on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// SSH port on the remote host.
    pub port: u16,
    /// Local directory receiving the fetched archives.
    pub out_dir: PathBuf,
    /// Resolution method: `auto`, `uris` or `rdepends`.
    pub method: ResolveMode,
    /// Package names never fetched by the dependency expansion strategy.
    pub skip: Vec<String>,
    /// Per-command timeout in seconds; `0` waits indefinitely.
    pub command_timeout_secs: u64,
    /// Bundle the fetched archives into a `.tar.gz` after a successful run.
    pub archive: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            method: ResolveMode::Auto,
            skip: Vec::new(),
            command_timeout_secs: 0,
            archive: false,
        }
    }
}

impl FetchConfig {
    /// Remote command timeout, `None` when unset.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// Reject values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for port `0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port".to_string(),
                value: "0".to_string(),
                valid: "1-65535".to_string(),
            });
        }
        Ok(())
    }
}

/// Split a comma-separated skip list, dropping blanks and surrounding spaces.
#[must_use]
pub fn parse_skip_list(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
