//! `debfetch PACKAGE`: fetch a package and its dependency closure.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::fetch::{FetchOptions, FetchOutcome, fetch_package};
use crate::domain::config::parse_skip_list;
use crate::domain::{FetchConfig, FetchError, ResolutionRequest, ResolveMode};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::ssh::{SshSession, SshTarget};
use crate::infra::{archive, fs};
use crate::output::json::{FetchSummary, format_summary};
use crate::output::reporter::TerminalReporter;

/// Arguments for the fetch.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Target Debian package name
    pub package: String,

    /// Remote host or IP
    #[arg(long, env = "DEBFETCH_HOST")]
    pub host: String,

    /// SSH username on the remote host
    #[arg(short, long, env = "DEBFETCH_USER")]
    pub user: String,

    /// SSH port [default: 22]
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Local output directory [default: ./deb_pkgs]
    #[arg(short, long = "out", visible_alias = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Resolution method: auto tries print-uris first then falls back,
    /// uris forces print-uris, rdepends forces dependency expansion
    #[arg(long)]
    pub method: Option<ResolveMode>,

    /// Packages never fetched by dependency expansion (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Bundle the fetched packages into a .tar.gz in the output directory
    #[arg(long)]
    pub archive: bool,

    /// Per remote command timeout in seconds (0 waits indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Effective settings after merging flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target: SshTarget,
    pub out_dir: PathBuf,
    pub mode: ResolveMode,
    pub excludes: Vec<String>,
    pub timeout: Option<Duration>,
    pub archive: bool,
}

impl FetchArgs {
    /// Merge with `config`; flags win.
    #[must_use]
    pub fn settings(&self, config: &FetchConfig) -> Settings {
        let excludes = if self.skip.is_empty() {
            parse_skip_list(&config.skip)
        } else {
            parse_skip_list(&self.skip)
        };
        let timeout = match self.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.command_timeout(),
        };
        Settings {
            target: SshTarget {
                host: self.host.clone(),
                user: self.user.clone(),
                port: self.port.unwrap_or(config.port),
            },
            out_dir: self.out_dir.clone().unwrap_or_else(|| config.out_dir.clone()),
            mode: self.method.unwrap_or(config.method),
            excludes,
            timeout,
            archive: self.archive || config.archive,
        }
    }
}

/// Run the fetch.
///
/// # Errors
///
/// Returns an error if the package name is invalid, the output directory
/// cannot be prepared, the SSH connection fails, or the fetch itself fails.
/// A `FetchError` is preserved as the root cause for exit-code mapping.
pub async fn run(app: &AppContext, args: FetchArgs, config: &FetchConfig) -> Result<()> {
    let settings = args.settings(config);
    let request = ResolutionRequest::new(args.package, settings.excludes.clone())?;

    fs::ensure_output_dir(&settings.out_dir)?;
    let existing = fs::existing_archives(&settings.out_dir)?;
    if !existing.is_empty() {
        let prompt = format!(
            "{} already holds {} .deb file(s); they may be overwritten. Continue?",
            settings.out_dir.display(),
            existing.len()
        );
        if !app.confirm(&prompt, true)? {
            return Err(FetchError::Aborted(format!(
                "declined to overwrite files in {}",
                settings.out_dir.display()
            ))
            .into());
        }
    }

    let reporter = TerminalReporter::new(&app.output);
    let target = &settings.target;
    reporter.step(&format!(
        "connecting to {}@{}:{}...",
        target.user, target.host, target.port
    ));
    let session =
        SshSession::connect(target.clone(), TokioCommandRunner::new(settings.timeout)).await?;

    let opts = FetchOptions {
        reporter: &reporter,
        request,
        mode: settings.mode,
        local_dir: &settings.out_dir,
        assume_yes: app.non_interactive,
        timeout: settings.timeout,
    };

    let result = until_interrupted(
        async { fetch_package(&session, opts).await.map_err(anyhow::Error::from) },
        tokio::signal::ctrl_c(),
    )
    .await;
    if let Err(e) = session.close().await {
        tracing::warn!("closing SSH session: {e:#}");
    }
    let outcome = result?;

    let archive_path = if settings.archive {
        let written = until_interrupted(
            write_archive(&settings.out_dir, &outcome),
            tokio::signal::ctrl_c(),
        )
        .await?;
        Some(written)
    } else {
        None
    };

    if app.is_json() {
        let summary = FetchSummary {
            package: outcome.package.clone(),
            strategy: outcome.strategy,
            files: outcome.files,
            archive: archive_path,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
        };
        println!("{}", format_summary(&summary)?);
        return Ok(());
    }

    app.output.success(&format!(
        "Done. Strategy: {}. Elapsed: {:.1}s",
        outcome.strategy,
        outcome.elapsed.as_secs_f64()
    ));
    let local = std::fs::canonicalize(&settings.out_dir).unwrap_or(settings.out_dir);
    app.output.kv("Files:", &outcome.files.len().to_string());
    app.output.kv("Output:", &local.display().to_string());
    if let Some(path) = archive_path {
        app.output.kv("Archive:", &path.display().to_string());
    }
    Ok(())
}

/// Run `work` unless `interrupt` fires first, in which case the result is
/// `FetchError::Interrupted`. Once a Ctrl-C listener is installed the default
/// SIGINT handler is gone, so every long step after connecting goes through
/// here.
async fn until_interrupted<T>(
    work: impl Future<Output = Result<T>>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<T> {
    tokio::select! {
        result = work => result,
        _ = interrupt => Err(FetchError::Interrupted.into()),
    }
}

async fn write_archive(out_dir: &std::path::Path, outcome: &FetchOutcome) -> Result<PathBuf> {
    let out_dir = out_dir.to_path_buf();
    let package = outcome.package.clone();
    let files = outcome.files.clone();
    tokio::task::spawn_blocking(move || {
        archive::bundle(&out_dir, &package, &files, chrono::Utc::now())
    })
    .await
    .context("spawn_blocking for archive")?
}
