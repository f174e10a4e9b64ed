//! JSON output helpers for `--json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::StrategyKind;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Summary of a successful run.
#[derive(Debug, Serialize)]
pub struct FetchSummary {
    pub package: String,
    pub strategy: StrategyKind,
    pub files: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub elapsed_secs: f64,
}

/// Pretty-print `summary`.
///
/// # Errors
///
/// Returns an error if a file path is not valid UTF-8.
pub fn format_summary(summary: &FetchSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("JSON serialization failed")
}
