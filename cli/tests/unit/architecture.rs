//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra → commands/output) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") || trimmed.starts_with("#[cfg(all(test") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-test, non-comment lines of every file under `src/<sub>`, with their
/// relative path and line number.
fn production_lines(sub: &[&str]) -> Vec<(String, usize, String)> {
    let mut dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    for part in sub {
        dir = dir.join(part);
    }
    let mut out = Vec::new();
    for file in collect_rs_files(&dir) {
        // Test helper modules are compiled only under cfg(test).
        if file.ends_with("test_support.rs") {
            continue;
        }
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            out.push((rel.clone(), i + 1, line.to_string()));
        }
    }
    out
}

fn violations(sub: &[&str], forbidden: &[&str]) -> Vec<String> {
    production_lines(sub)
        .into_iter()
        .filter_map(|(rel, lineno, line)| {
            forbidden
                .iter()
                .find(|f| line.contains(*f))
                .map(|f| format!("{rel}:{lineno}: `{f}`: {line}"))
        })
        .collect()
}

#[test]
fn domain_is_pure() {
    let found = violations(
        &["domain"],
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(found.is_empty(), "domain/ must stay pure:\n{}", found.join("\n"));
}

#[test]
fn services_import_only_domain_and_ports() {
    let found = violations(
        &["application", "services"],
        &["crate::infra", "crate::commands", "crate::output", "std::fs", "std::process"],
    );
    assert!(
        found.is_empty(),
        "application/services/ must depend only on domain and ports:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let found = violations(&["infra"], &["crate::commands", "crate::output"]);
    assert!(
        found.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let found = violations(&["infra"], &["println!", "eprintln!"]);
    assert!(
        found.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        found.join("\n")
    );
}

#[test]
fn no_concrete_executor_types_in_service_signatures() {
    let found: Vec<String> = production_lines(&["application", "services"])
        .into_iter()
        .filter(|(_, _, line)| line.contains("fn "))
        .filter(|(_, _, line)| {
            ["SshSession", "TokioCommandRunner"]
                .iter()
                .any(|t| line.contains(t))
        })
        .map(|(rel, lineno, line)| format!("{rel}:{lineno}: {line}"))
        .collect();
    assert!(
        found.is_empty(),
        "services must take `impl RemoteExecutor`, not concrete transports:\n{}",
        found.join("\n")
    );
}
