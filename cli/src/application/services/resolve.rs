//! Dependency resolution strategies.
//!
//! Each strategy asks the remote package tools what has to be fetched and
//! parses the answer with the matching `domain::parse` function. An empty
//! answer is a failure, never "nothing to do".

use std::time::Duration;

use crate::application::ports::RemoteExecutor;
use crate::domain::package::apply_excludes;
use crate::domain::parse::{parse_apt_cache_depends, parse_print_uris, parse_rdepends};
use crate::domain::{
    CommandResult, FetchError, RemoteCommand, ResolutionRequest, ResolutionResult, StrategyKind,
};

/// Failure reason when print-URIs ran fine but listed nothing.
pub const NO_URIS_REASON: &str =
    "no URIs returned; the package name may be invalid or the apt lists are stale";

/// A way of turning a package name into something downloadable.
#[allow(async_fn_in_trait)]
pub trait ResolutionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Build the remote command for `request`.
    fn command(&self, request: &ResolutionRequest) -> RemoteCommand;

    /// Turn the command's stdout into a result. `Ok` results are non-empty.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Resolution` when nothing usable was produced.
    fn interpret(
        &self,
        request: &ResolutionRequest,
        stdout: &str,
    ) -> Result<ResolutionResult, FetchError>;

    /// Run the strategy against the remote host.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Resolution` on transport failure, non-zero exit,
    /// or empty output.
    async fn resolve(
        &self,
        exec: &impl RemoteExecutor,
        request: &ResolutionRequest,
    ) -> Result<ResolutionResult, FetchError> {
        let command = self.command(request);
        let result = run(exec, self.kind(), &command).await?;
        self.interpret(request, &result.stdout)
    }
}

async fn run(
    exec: &impl RemoteExecutor,
    kind: StrategyKind,
    command: &RemoteCommand,
) -> Result<CommandResult, FetchError> {
    let result = exec
        .execute(command)
        .await
        .map_err(|e| FetchError::resolution(kind, format!("{e:#}")))?;
    if !result.success() {
        return Err(FetchError::resolution(kind, result.failure_reason()));
    }
    Ok(result)
}

// ── print-uris ────────────────────────────────────────────────────────────────

/// `apt-get --print-uris install`: the remote solver computes the full
/// closure in one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintUris {
    pub timeout: Option<Duration>,
}

impl ResolutionStrategy for PrintUris {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PrintUris
    }

    fn command(&self, request: &ResolutionRequest) -> RemoteCommand {
        RemoteCommand::new("apt-get")
            .env("LC_ALL", "C")
            .args([
                "--print-uris",
                "--yes",
                "-o",
                "Debug::NoLocking=1",
                "--no-install-recommends",
                "install",
            ])
            .arg(&request.package)
            .timeout(self.timeout)
    }

    fn interpret(
        &self,
        _request: &ResolutionRequest,
        stdout: &str,
    ) -> Result<ResolutionResult, FetchError> {
        let uris = parse_print_uris(stdout);
        if uris.is_empty() {
            return Err(FetchError::resolution(self.kind(), NO_URIS_REASON));
        }
        Ok(ResolutionResult::Uris(uris))
    }
}

// ── expansion ─────────────────────────────────────────────────────────────────

fn expanded(
    kind: StrategyKind,
    packages: Vec<String>,
    excludes: &[String],
) -> Result<ResolutionResult, FetchError> {
    if packages.is_empty() {
        return Err(FetchError::resolution(
            kind,
            "dependency expansion returned an empty list",
        ));
    }
    let kept = apply_excludes(packages, excludes);
    if kept.is_empty() {
        return Err(FetchError::resolution(
            kind,
            "every expanded package is in the skip list",
        ));
    }
    Ok(ResolutionResult::Packages(kept))
}

/// `apt-rdepends -p`: target plus required dependencies, flush-left names.
#[derive(Debug, Clone, Copy, Default)]
pub struct AptRdepends {
    pub timeout: Option<Duration>,
}

impl ResolutionStrategy for AptRdepends {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AptRdepends
    }

    fn command(&self, request: &ResolutionRequest) -> RemoteCommand {
        RemoteCommand::new("apt-rdepends")
            .env("LC_ALL", "C")
            .arg("-p")
            .arg(&request.package)
            .timeout(self.timeout)
    }

    fn interpret(
        &self,
        request: &ResolutionRequest,
        stdout: &str,
    ) -> Result<ResolutionResult, FetchError> {
        expanded(self.kind(), parse_rdepends(stdout), &request.excludes)
    }
}

/// `apt-cache depends --recurse`, restricted to hard dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AptCacheDepends {
    pub timeout: Option<Duration>,
}

impl ResolutionStrategy for AptCacheDepends {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AptCacheDepends
    }

    fn command(&self, request: &ResolutionRequest) -> RemoteCommand {
        RemoteCommand::new("apt-cache")
            .env("LC_ALL", "C")
            .args([
                "depends",
                "--recurse",
                "--no-recommends",
                "--no-suggests",
                "--no-conflicts",
                "--no-breaks",
                "--no-replaces",
                "--no-enhances",
            ])
            .arg(&request.package)
            .timeout(self.timeout)
    }

    fn interpret(
        &self,
        request: &ResolutionRequest,
        stdout: &str,
    ) -> Result<ResolutionResult, FetchError> {
        let packages = parse_apt_cache_depends(&request.package, stdout);
        expanded(self.kind(), packages, &request.excludes)
    }
}
