//! Application service: fetch a package and its dependency closure.
//!
//! Sequence: probe host → create scratch dir → resolve (with fallback in
//! automatic mode) → download → enumerate → transfer → cleanup.
//! The scratch directory is removed only on success; after any failure it is
//! left on the remote host for inspection.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::application::ports::{ProgressReporter, RemoteExecutor};
use crate::application::services::download::{download_by_package_name, download_by_uri};
use crate::application::services::probe;
use crate::application::services::resolve::{
    AptCacheDepends, AptRdepends, NO_URIS_REASON, PrintUris, ResolutionStrategy,
};
use crate::domain::parse::parse_file_listing;
use crate::domain::{
    DownloadedArtifact, FetchError, RemoteCommand, ResolutionRequest, ResolutionResult,
    ResolveMode, StrategyKind,
};

/// Template passed to `mktemp -d` on the remote host.
pub const SCRATCH_TEMPLATE: &str = "/tmp/debfetch-XXXXXXXX";
const SCRATCH_PREFIX: &str = "/tmp/debfetch-";

/// Inputs of one fetch run.
pub struct FetchOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub request: ResolutionRequest,
    pub mode: ResolveMode,
    /// Local directory receiving the archives. Must already exist.
    pub local_dir: &'a Path,
    /// Suppress the "no URIs returned" warning.
    pub assume_yes: bool,
    /// Timeout applied to every remote command; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Result of a successful fetch run.
#[derive(Debug)]
pub struct FetchOutcome {
    pub package: String,
    pub strategy: StrategyKind,
    /// Local paths of the transferred archives, sorted by name.
    pub files: Vec<PathBuf>,
    pub scratch_dir: String,
    pub elapsed: Duration,
}

/// Fetch `request.package` and everything it needs into `local_dir`.
///
/// # Errors
///
/// Returns the `FetchError` of the first fatal step. In automatic mode a
/// failed print-URIs attempt is followed by dependency expansion, and if that
/// fails too the error carries both causes.
pub async fn fetch_package(
    exec: &impl RemoteExecutor,
    opts: FetchOptions<'_, impl ProgressReporter>,
) -> Result<FetchOutcome, FetchError> {
    let started = Instant::now();
    let FetchOptions {
        reporter,
        request,
        mode,
        local_dir,
        assume_yes,
        timeout,
    } = opts;

    reporter.step("checking remote host...");
    probe::assert_package_manager_present(exec).await?;

    let scratch_dir = create_scratch_dir(exec, timeout).await?;
    tracing::debug!(scratch_dir = %scratch_dir, "created remote scratch directory");

    let ctx = Attempt {
        exec,
        reporter,
        request: &request,
        scratch_dir: &scratch_dir,
        timeout,
    };

    let strategy = match mode {
        ResolveMode::Uris => ctx.via_print_uris(assume_yes).await?,
        ResolveMode::Rdepends => ctx.via_expansion().await?,
        ResolveMode::Auto => match ctx.via_print_uris(assume_yes).await {
            Ok(kind) => kind,
            Err(primary) if primary.allows_fallback() => {
                reporter.warn(&format!("primary strategy failed: {primary}"));
                ctx.retry_via_expansion()
                    .await
                    .map_err(|secondary| FetchError::BothStrategiesFailed {
                        primary: Box::new(primary),
                        secondary: Box::new(secondary),
                    })?
            }
            Err(e) => return Err(e),
        },
    };

    let files = transfer_artifacts(exec, reporter, &scratch_dir, local_dir, timeout).await?;

    reporter.step("cleaning up remote scratch directory...");
    if let Err(e) = cleanup_scratch_dir(exec, &scratch_dir).await {
        reporter.warn(&format!("cleanup failed: {e}"));
    }

    Ok(FetchOutcome {
        package: request.package,
        strategy,
        files,
        scratch_dir,
        elapsed: started.elapsed(),
    })
}

struct Attempt<'a, E: RemoteExecutor, R: ProgressReporter> {
    exec: &'a E,
    reporter: &'a R,
    request: &'a ResolutionRequest,
    scratch_dir: &'a str,
    timeout: Option<Duration>,
}

impl<E: RemoteExecutor, R: ProgressReporter> Attempt<'_, E, R> {
    async fn via_print_uris(&self, assume_yes: bool) -> Result<StrategyKind, FetchError> {
        let strategy = PrintUris {
            timeout: self.timeout,
        };
        self.reporter.step(&format!(
            "resolving '{}' via {}...",
            self.request.package,
            strategy.kind()
        ));
        let resolved = match strategy.resolve(self.exec, self.request).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if !assume_yes && is_empty_uri_list(&e) {
                    self.reporter.warn(
                        "No URIs returned by print-uris. The package name may be invalid or the apt lists are stale.",
                    );
                }
                return Err(e);
            }
        };
        self.download(strategy.kind(), &resolved).await
    }

    async fn via_expansion(&self) -> Result<StrategyKind, FetchError> {
        let (kind, resolved) = if probe::has_dependency_expansion_tool(self.exec).await {
            let strategy = AptRdepends {
                timeout: self.timeout,
            };
            self.resolve_with(&strategy).await?
        } else {
            self.reporter
                .warn("apt-rdepends not found. Falling back to apt-cache depends.");
            let strategy = AptCacheDepends {
                timeout: self.timeout,
            };
            self.resolve_with(&strategy).await?
        };
        self.download(kind, &resolved).await
    }

    /// Expansion after a failed print-URIs attempt. Whatever that attempt
    /// managed to download is discarded first so `--skip` still holds.
    async fn retry_via_expansion(&self) -> Result<StrategyKind, FetchError> {
        discard_artifacts(self.exec, self.scratch_dir, self.timeout).await?;
        self.via_expansion().await
    }

    async fn resolve_with(
        &self,
        strategy: &impl ResolutionStrategy,
    ) -> Result<(StrategyKind, ResolutionResult), FetchError> {
        self.reporter.step(&format!(
            "resolving '{}' via {}...",
            self.request.package,
            strategy.kind()
        ));
        let resolved = strategy.resolve(self.exec, self.request).await?;
        Ok((strategy.kind(), resolved))
    }

    async fn download(
        &self,
        kind: StrategyKind,
        resolved: &ResolutionResult,
    ) -> Result<StrategyKind, FetchError> {
        match resolved {
            ResolutionResult::Uris(uris) => {
                self.reporter
                    .step(&format!("downloading {} file(s) on remote host...", uris.len()));
                download_by_uri(self.exec, uris, self.scratch_dir, self.timeout).await?;
            }
            ResolutionResult::Packages(packages) => {
                self.reporter.step(&format!(
                    "downloading {} package(s) on remote host...",
                    packages.len()
                ));
                download_by_package_name(self.exec, packages, self.scratch_dir, self.timeout)
                    .await?;
            }
        }
        self.reporter
            .success(&format!("downloaded {} item(s) via {kind}", resolved.len()));
        Ok(kind)
    }
}

fn is_empty_uri_list(err: &FetchError) -> bool {
    matches!(
        err,
        FetchError::Resolution {
            strategy: StrategyKind::PrintUris,
            reason,
        } if reason == NO_URIS_REASON
    )
}

/// Create a fresh scratch directory on the remote host and return its path.
///
/// # Errors
///
/// Returns `FetchError::Remote` if `mktemp` fails or prints nothing.
pub async fn create_scratch_dir(
    exec: &impl RemoteExecutor,
    timeout: Option<Duration>,
) -> Result<String, FetchError> {
    let action = "creating remote temp directory";
    let command = RemoteCommand::new("mktemp")
        .args(["-d", SCRATCH_TEMPLATE])
        .timeout(timeout);
    let result = exec.execute(&command).await.map_err(|e| FetchError::Remote {
        action: action.to_string(),
        reason: format!("{e:#}"),
    })?;
    if !result.success() {
        return Err(FetchError::Remote {
            action: action.to_string(),
            reason: result.failure_reason(),
        });
    }
    let path = result.stdout.trim();
    if !path.starts_with(SCRATCH_PREFIX) {
        return Err(FetchError::Remote {
            action: action.to_string(),
            reason: format!("unexpected mktemp output {path:?}"),
        });
    }
    Ok(path.to_string())
}

/// List the archives sitting directly inside `scratch_dir`.
///
/// # Errors
///
/// Returns `FetchError::Remote` if the listing command fails.
pub async fn list_artifacts(
    exec: &impl RemoteExecutor,
    scratch_dir: &str,
    timeout: Option<Duration>,
) -> Result<Vec<DownloadedArtifact>, FetchError> {
    let command = find_archives(scratch_dir, "-print").timeout(timeout);
    let stdout = run_remote(exec, &command, "enumerating downloaded .deb files").await?;
    Ok(parse_file_listing(&stdout)
        .iter()
        .filter_map(|path| DownloadedArtifact::from_remote_path(path))
        .collect())
}

/// Delete the archives sitting directly inside `scratch_dir`, leaving the
/// directory itself in place.
///
/// # Errors
///
/// Returns `FetchError::Remote` if the delete command fails.
pub async fn discard_artifacts(
    exec: &impl RemoteExecutor,
    scratch_dir: &str,
    timeout: Option<Duration>,
) -> Result<(), FetchError> {
    let command = find_archives(scratch_dir, "-delete").timeout(timeout);
    run_remote(exec, &command, "discarding partial downloads").await?;
    Ok(())
}

fn find_archives(scratch_dir: &str, action: &str) -> RemoteCommand {
    RemoteCommand::new("find").args([
        scratch_dir,
        "-maxdepth",
        "1",
        "-type",
        "f",
        "-name",
        "*.deb",
        action,
    ])
}

async fn run_remote(
    exec: &impl RemoteExecutor,
    command: &RemoteCommand,
    action: &str,
) -> Result<String, FetchError> {
    let result = exec.execute(command).await.map_err(|e| FetchError::Remote {
        action: action.to_string(),
        reason: format!("{e:#}"),
    })?;
    if !result.success() {
        return Err(FetchError::Remote {
            action: action.to_string(),
            reason: result.failure_reason(),
        });
    }
    Ok(result.stdout)
}

async fn transfer_artifacts(
    exec: &impl RemoteExecutor,
    reporter: &impl ProgressReporter,
    scratch_dir: &str,
    local_dir: &Path,
    timeout: Option<Duration>,
) -> Result<Vec<PathBuf>, FetchError> {
    let artifacts = list_artifacts(exec, scratch_dir, timeout).await?;
    if artifacts.is_empty() {
        return Err(FetchError::NoArtifacts {
            dir: scratch_dir.to_string(),
        });
    }

    reporter.step(&format!(
        "copying {} .deb file(s) to {}...",
        artifacts.len(),
        local_dir.display()
    ));
    let mut files = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let dest = artifact.local_destination(local_dir);
        exec.retrieve_file(&artifact.remote_path, &dest)
            .await
            .map_err(|e| FetchError::Transfer {
                remote: artifact.remote_path.clone(),
                reason: format!("{e:#}"),
            })?;
        tracing::debug!(remote = %artifact.remote_path, local = %dest.display(), "transferred");
        files.push(dest);
    }
    reporter.success(&format!("copied {} file(s)", files.len()));
    Ok(files)
}

/// Remove `scratch_dir` on the remote host. Removing a directory that is
/// already gone succeeds.
///
/// # Errors
///
/// `InvalidInput` for paths outside the scratch prefix, `Remote` if `rm`
/// fails.
pub async fn cleanup_scratch_dir(
    exec: &impl RemoteExecutor,
    scratch_dir: &str,
) -> Result<(), FetchError> {
    let is_scratch = scratch_dir
        .strip_prefix(SCRATCH_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'));
    if !is_scratch {
        return Err(FetchError::InvalidInput(format!(
            "refusing to remove {scratch_dir:?}: not a scratch directory"
        )));
    }
    let command = RemoteCommand::new("rm").args(["-rf", scratch_dir]);
    let action = "removing remote scratch directory";
    let result = exec.execute(&command).await.map_err(|e| FetchError::Remote {
        action: action.to_string(),
        reason: format!("{e:#}"),
    })?;
    if !result.success() {
        return Err(FetchError::Remote {
            action: action.to_string(),
            reason: result.failure_reason(),
        });
    }
    Ok(())
}
