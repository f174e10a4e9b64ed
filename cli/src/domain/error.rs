//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! Services return `FetchError` directly; the command layer converts it to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

use crate::domain::package::StrategyKind;

// ── Fetch errors ──────────────────────────────────────────────────────────────

/// Every way a fetch run can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "Remote host does not have apt-get. This tool requires a Debian/Ubuntu-like system."
    )]
    UnsupportedHost,

    #[error("{strategy} failed: {reason}")]
    Resolution {
        strategy: StrategyKind,
        reason: String,
    },

    #[error("Both strategies failed. Primary: {primary} | Secondary: {secondary}")]
    BothStrategiesFailed {
        primary: Box<FetchError>,
        secondary: Box<FetchError>,
    },

    #[error("Neither wget nor curl found on remote host.")]
    NoDownloader,

    #[error("Download failed for {target}: {reason}")]
    Download { target: String, reason: String },

    #[error("No .deb files found in {dir} after download. Aborting.")]
    NoArtifacts { dir: String },

    #[error("Transfer failed for {remote}: {reason}")]
    Transfer { remote: String, reason: String },

    #[error("Remote command failed while {action}: {reason}")]
    Remote { action: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Interrupted by user.")]
    Interrupted,

    #[error("Aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Build a resolution failure for `strategy`.
    pub fn resolution(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        Self::Resolution {
            strategy,
            reason: reason.into(),
        }
    }

    /// `true` when automatic mode may fall back to the expansion strategy
    /// after this failure on the print-URIs path.
    #[must_use]
    pub fn allows_fallback(&self) -> bool {
        !matches!(
            self,
            Self::Interrupted | Self::Aborted(_) | Self::InvalidInput(_)
        )
    }

    /// Stable machine-readable code for `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedHost => "unsupported_host",
            Self::Resolution { .. } => "resolution_failed",
            Self::BothStrategiesFailed { .. } => "both_strategies_failed",
            Self::NoDownloader => "no_downloader",
            Self::Download { .. } => "download_failed",
            Self::NoArtifacts { .. } => "no_artifacts",
            Self::Transfer { .. } => "transfer_failed",
            Self::Remote { .. } => "remote_command_failed",
            Self::InvalidInput(_) => "invalid_input",
            Self::Interrupted => "interrupted",
            Self::Aborted(_) => "aborted",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
