//! Parsers for the text output of the remote package tools.
//!
//! Each tool's format lives in exactly one function here so that a format
//! change on some apt release is a local, testable fix.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::package::dedup_preserving_order;

static QUOTED_URI: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Pattern is a compile-time constant
    Regex::new(r"'(https?://[^']+)'").expect("valid regex")
});

static DEPENDS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Pattern is a compile-time constant
    Regex::new(r"^\s*(?:Pre)?Depends:\s*(.*)$").expect("valid regex")
});

/// Extract download URLs from `apt-get --print-uris install` output.
///
/// Each fetchable file is printed as `'URL' FILENAME SIZE HASH`; only the
/// quoted `http://` / `https://` token matters.
#[must_use]
pub fn parse_print_uris(stdout: &str) -> Vec<String> {
    let uris = stdout
        .lines()
        .filter_map(|line| QUOTED_URI.captures(line.trim_start()))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    dedup_preserving_order(uris)
}

/// Extract package names from `apt-rdepends` output.
///
/// Concrete packages are printed flush left; indented lines are the
/// `Depends:`/`PreDepends:` annotations under each one.
#[must_use]
pub fn parse_rdepends(stdout: &str) -> Vec<String> {
    let names = stdout
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    dedup_preserving_order(names)
}

/// Extract package names from `apt-cache depends --recurse` output.
///
/// Keeps the value of every `Depends:`/`PreDepends:` line, strips version
/// constraints and `|` alternatives, drops `<virtual>` names, prepends
/// `package` itself, then deduplicates and sorts.
#[must_use]
pub fn parse_apt_cache_depends(package: &str, stdout: &str) -> Vec<String> {
    let mut names: Vec<String> = stdout
        .lines()
        .filter_map(|line| DEPENDS_LINE.captures(line))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| clean_dependency(m.as_str()))
        .collect();
    names.push(package.to_string());
    names.sort();
    names.dedup();
    names
}

fn clean_dependency(raw: &str) -> Option<String> {
    let no_alt = raw.split('|').next().unwrap_or_default();
    let no_version = no_alt.split('(').next().unwrap_or_default();
    let name = no_version.trim();
    if name.is_empty() || name.starts_with('<') {
        return None;
    }
    Some(name.to_string())
}

/// Split a remote file listing (one path per line) into sorted paths.
#[must_use]
pub fn parse_file_listing(stdout: &str) -> Vec<String> {
    let mut files: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    files.sort();
    files
}
