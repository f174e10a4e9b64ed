//! OpenSSH-backed implementation of the `RemoteExecutor` port.
//!
//! `SshSession` opens one control-master connection per run and multiplexes
//! every command and file copy over its socket, so authentication (keys,
//! agent, or an interactive password prompt) happens exactly once and is
//! handled entirely by `ssh` itself.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::application::ports::{CommandRunner, RemoteExecutor};
use crate::domain::{CommandResult, RemoteCommand};

/// Seconds `ssh` waits for the TCP connection before giving up.
const CONNECT_TIMEOUT_SECS: u32 = 20;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
}

impl SshTarget {
    /// `user@host` as passed to `ssh`.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// One authenticated session to a remote host.
///
/// Must be released with [`SshSession::close`]; dropping an open session
/// closes it synchronously as a fallback.
pub struct SshSession<R: CommandRunner> {
    target: SshTarget,
    runner: R,
    control_path: PathBuf,
    closed: AtomicBool,
    // Holds the control socket; removed on drop.
    _control_dir: TempDir,
}

impl<R: CommandRunner> SshSession<R> {
    /// Open the control master connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the local socket directory cannot be created or
    /// `ssh` fails to connect or authenticate.
    pub async fn connect(target: SshTarget, runner: R) -> Result<Self> {
        let control_dir = tempfile::Builder::new()
            .prefix("debfetch-ssh-")
            .tempdir()
            .context("creating SSH control socket directory")?;
        let control_path = control_dir.path().join("control.sock");

        let session = Self {
            target,
            runner,
            control_path,
            closed: AtomicBool::new(false),
            _control_dir: control_dir,
        };

        let control = session.control_option();
        let port = session.target.port.to_string();
        let connect_timeout = format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}");
        let destination = session.target.destination();
        tracing::debug!(destination = %destination, port = %port, "opening SSH control master");

        // Inherited stdio: the master backgrounds itself with -f and would
        // otherwise hold captured pipes open; a password prompt needs the TTY.
        let status = session
            .runner
            .run_status(
                "ssh",
                &[
                    "-o",
                    "ControlMaster=yes",
                    "-o",
                    "ControlPersist=yes",
                    "-o",
                    &control,
                    "-o",
                    &connect_timeout,
                    "-f",
                    "-N",
                    "-p",
                    &port,
                    &destination,
                ],
            )
            .await
            .context("starting ssh")?;

        if !status.success() {
            // Nothing to tear down; keep Drop from trying.
            session.closed.store(true, Ordering::SeqCst);
            anyhow::bail!(
                "SSH connection to {destination} (port {port}) failed. \
                 Please verify the host, credentials or keys."
            );
        }
        Ok(session)
    }

    fn control_option(&self) -> String {
        format!("ControlPath={}", self.control_path.display())
    }

    /// Close the control master. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if `ssh -O exit` cannot be spawned.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let control = self.control_option();
        let destination = self.target.destination();
        let output = self
            .runner
            .run("ssh", &["-o", &control, "-O", "exit", &destination])
            .await
            .context("closing SSH session")?;
        tracing::debug!(code = ?output.status.code(), "SSH control master closed");
        Ok(())
    }
}

impl<R: CommandRunner> RemoteExecutor for SshSession<R> {
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult> {
        anyhow::ensure!(
            !self.closed.load(Ordering::SeqCst),
            "SSH session is closed"
        );
        let rendered = command.to_shell();
        let control = self.control_option();
        let port = self.target.port.to_string();
        let destination = self.target.destination();
        tracing::debug!(command = %rendered, "executing on remote");

        let output = self
            .runner
            .run_with_timeout(
                "ssh",
                &[
                    "-o",
                    &control,
                    "-o",
                    "BatchMode=yes",
                    "-p",
                    &port,
                    &destination,
                    "--",
                    &rendered,
                ],
                command.get_timeout(),
            )
            .await
            .with_context(|| format!("remote command `{rendered}`"))?;

        let result = CommandResult::new(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        tracing::debug!(
            exit = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "remote command finished"
        );
        Ok(result)
    }

    async fn retrieve_file(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        anyhow::ensure!(
            !self.closed.load(Ordering::SeqCst),
            "SSH session is closed"
        );
        let control = self.control_option();
        let port = self.target.port.to_string();
        let source = format!("{}:{remote_path}", self.target.destination());
        let local = local_path
            .to_str()
            .with_context(|| format!("local path {} is not valid UTF-8", local_path.display()))?;

        let output = self
            .runner
            .run_with_timeout(
                "scp",
                &["-q", "-o", &control, "-o", "BatchMode=yes", "-P", &port, &source, local],
                None,
            )
            .await
            .with_context(|| format!("scp get failed for {remote_path}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("scp get failed for {remote_path}: {}", stderr.trim());
        }
        Ok(())
    }
}

impl<R: CommandRunner> Drop for SshSession<R> {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let control = self.control_option();
        let destination = self.target.destination();
        let _ = std::process::Command::new("ssh")
            .args(["-o", control.as_str(), "-O", "exit", destination.as_str()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }
}
