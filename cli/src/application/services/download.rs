//! Download execution into the remote scratch directory.
//!
//! Both entry points treat the batch as one unit: the first failing fetch
//! fails the whole call and nothing after it is attempted.

use std::time::Duration;

use crate::application::ports::RemoteExecutor;
use crate::application::services::probe::{Downloader, choose_downloader};
use crate::domain::package::uri_basename;
use crate::domain::{FetchError, RemoteCommand};

/// Build the fetch command for one URI.
#[must_use]
pub fn uri_command(downloader: Downloader, uri: &str, scratch_dir: &str) -> RemoteCommand {
    match downloader {
        Downloader::Wget => RemoteCommand::new("wget").args(["-q", "-P", scratch_dir, uri]),
        Downloader::Curl => {
            let dest = format!("{}/{}", scratch_dir.trim_end_matches('/'), uri_basename(uri));
            RemoteCommand::new("curl").args([
                "-L",
                "--fail",
                "--silent",
                "--show-error",
                "-o",
                dest.as_str(),
                uri,
            ])
        }
    }
}

/// Fetch every URI into `scratch_dir` with wget (or curl if wget is absent).
///
/// # Errors
///
/// `InvalidInput` for an empty list, `NoDownloader` when neither tool
/// exists, `Download` for the first URI that fails.
pub async fn download_by_uri(
    exec: &impl RemoteExecutor,
    uris: &[String],
    scratch_dir: &str,
    timeout: Option<Duration>,
) -> Result<(), FetchError> {
    if uris.is_empty() {
        return Err(FetchError::InvalidInput(
            "empty URI list; nothing to download".to_string(),
        ));
    }
    let downloader = choose_downloader(exec).await?;
    tracing::debug!(downloader = downloader.program(), count = uris.len(), "downloading URIs");

    for uri in uris {
        let command = uri_command(downloader, uri, scratch_dir).timeout(timeout);
        run_one(exec, &command, uri).await?;
    }
    Ok(())
}

/// Run `apt-get download` for every package from inside `scratch_dir`.
///
/// # Errors
///
/// `InvalidInput` for an empty list, `Download` for the first package that
/// fails.
pub async fn download_by_package_name(
    exec: &impl RemoteExecutor,
    packages: &[String],
    scratch_dir: &str,
    timeout: Option<Duration>,
) -> Result<(), FetchError> {
    if packages.is_empty() {
        return Err(FetchError::InvalidInput(
            "empty package list; nothing to download".to_string(),
        ));
    }
    for package in packages {
        let command = RemoteCommand::new("apt-get")
            .args(["download", package.as_str()])
            .current_dir(scratch_dir)
            .timeout(timeout);
        run_one(exec, &command, package).await?;
    }
    Ok(())
}

async fn run_one(
    exec: &impl RemoteExecutor,
    command: &RemoteCommand,
    target: &str,
) -> Result<(), FetchError> {
    let result = exec.execute(command).await.map_err(|e| FetchError::Download {
        target: target.to_string(),
        reason: format!("{e:#}"),
    })?;
    if !result.success() {
        return Err(FetchError::Download {
            target: target.to_string(),
            reason: result.failure_reason(),
        });
    }
    Ok(())
}
