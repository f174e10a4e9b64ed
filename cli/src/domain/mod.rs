//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod config;
pub mod error;
pub mod package;
pub mod parse;

pub use command::{CommandResult, RemoteCommand, quote};
pub use config::FetchConfig;
pub use error::{ConfigError, FetchError};
pub use package::{
    DownloadedArtifact, ResolutionRequest, ResolutionResult, ResolveMode, StrategyKind,
};
