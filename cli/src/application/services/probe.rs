//! Host capability probe: which tools the remote host offers.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::RemoteExecutor;
use crate::domain::{FetchError, RemoteCommand};

/// Base package manager; its absence is fatal.
pub const PACKAGE_MANAGER: &str = "apt-get";
/// Optional dependency expansion tool.
pub const EXPANSION_TOOL: &str = "apt-rdepends";

/// Remote tool used to fetch URIs, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downloader {
    Wget,
    Curl,
}

impl Downloader {
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Wget => "wget",
            Self::Curl => "curl",
        }
    }
}

/// `true` if `tool` resolves on the remote `PATH`.
///
/// A transport failure counts as "not present".
pub async fn has_tool(exec: &impl RemoteExecutor, tool: &str) -> bool {
    let probe = RemoteCommand::new("command").args(["-v", tool]);
    match exec.execute(&probe).await {
        Ok(result) => result.success(),
        Err(e) => {
            tracing::debug!(tool, error = %e, "tool probe failed");
            false
        }
    }
}

/// Fail unless the base package manager is installed on the remote host.
///
/// # Errors
///
/// Returns `FetchError::UnsupportedHost` when `apt-get` is missing, or
/// `FetchError::Remote` when the probe itself could not run.
pub async fn assert_package_manager_present(exec: &impl RemoteExecutor) -> Result<(), FetchError> {
    let probe = RemoteCommand::new("command").args(["-v", PACKAGE_MANAGER]);
    let result = exec.execute(&probe).await.map_err(|e| FetchError::Remote {
        action: "probing the remote host".to_string(),
        reason: format!("{e:#}"),
    })?;
    if result.success() {
        Ok(())
    } else {
        Err(FetchError::UnsupportedHost)
    }
}

/// Whether the optional expansion tool is installed. Never fails.
pub async fn has_dependency_expansion_tool(exec: &impl RemoteExecutor) -> bool {
    has_tool(exec, EXPANSION_TOOL).await
}

/// Pick the first available downloader.
///
/// # Errors
///
/// Returns `FetchError::NoDownloader` when neither `wget` nor `curl` exists.
pub async fn choose_downloader(exec: &impl RemoteExecutor) -> Result<Downloader, FetchError> {
    for downloader in [Downloader::Wget, Downloader::Curl] {
        if has_tool(exec, downloader.program()).await {
            return Ok(downloader);
        }
    }
    Err(FetchError::NoDownloader)
}
