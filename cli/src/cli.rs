//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::Parser;

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::application::ports::ConfigStore;
use crate::commands;
use crate::domain::FetchError;
use crate::infra::config::YamlConfigStore;

/// Exit code for a handled failure, including a declined prompt.
pub const EXIT_FAILURE: i32 = 2;
/// Exit code after Ctrl-C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Process exit code for a failed run.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FetchError>() {
        Some(FetchError::Interrupted) => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

/// Fetch a Debian package and its dependencies from a remote host over SSH
#[derive(Parser)]
#[command(name = "debfetch", version, arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub fetch: commands::fetch::FetchArgs,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Execute the fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the fetch fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            fetch,
            yes,
            verbose: _,
            json,
            quiet,
            no_color,
        } = self;

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        });
        let config = YamlConfigStore::new().load()?;
        commands::fetch::run(&app, fetch, &config).await
    }
}
