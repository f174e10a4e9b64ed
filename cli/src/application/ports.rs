//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{CommandResult, FetchConfig, RemoteCommand};

// ── Remote Executor Port ──────────────────────────────────────────────────────

/// Command execution and file retrieval on one remote host.
///
/// Implementations own a single authenticated session; an `Err` means the
/// transport itself failed; a command that ran and exited non-zero is an
/// `Ok` result carrying its exit code.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    /// Run `command` on the remote host and capture its output.
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult>;
    /// Copy `remote_path` from the remote host to `local_path`.
    ///
    /// # Errors
    ///
    /// Returns an error on any I/O or transport problem.
    async fn retrieve_file(&self, remote_path: &str, local_path: &Path) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, using the runner's default
    /// timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a timeout override; `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading of persisted defaults.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when none exists.
    fn load(&self) -> Result<FetchConfig>;
    /// Path the configuration is read from.
    fn path(&self) -> Result<PathBuf>;
}
