//! debfetch - fetch a Debian package and its dependencies over SSH

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use tracing_subscriber::EnvFilter;

use debfetch::cli::{Cli, exit_code};
use debfetch::domain::FetchError;
use debfetch::output::OutputContext;
use debfetch::output::json::format_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let (json, no_color) = (cli.json, cli.no_color);

    if let Err(e) = cli.run().await {
        if json {
            let code = e.downcast_ref::<FetchError>().map_or("error", FetchError::code);
            match format_error(&format!("{e:#}"), code) {
                Ok(obj) => println!("{obj}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            OutputContext::new(no_color, false).error(&format!("Error: {e:#}"));
        }
        std::process::exit(exit_code(&e));
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
