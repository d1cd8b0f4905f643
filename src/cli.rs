// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, ValueEnum};

use crate::events::EventKind;

/// Command-line arguments for `buildrelay`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrelay",
    version,
    about = "Run an external build tool and relay lifecycle events.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Buildrelay.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Buildrelay.toml")]
    pub config: String,

    /// Event family the job reports under.
    #[arg(long, value_enum, value_name = "KIND", default_value = "build")]
    pub kind: JobKind,

    /// Project directory the tool runs in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: String,

    /// Use this process id as the job id instead of a generated token.
    #[arg(long, value_name = "ID")]
    pub job_id: Option<u64>,

    /// Run synchronously even if the config says otherwise.
    #[arg(long)]
    pub sync: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRELAY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved invocation, but don't execute.
    #[arg(long)]
    pub dry_run: bool,
}

/// Event kind as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum JobKind {
    Build,
    Test,
    Deploy,
}

impl From<JobKind> for EventKind {
    fn from(kind: JobKind) -> Self {
        match kind {
            JobKind::Build => EventKind::Build,
            JobKind::Test => EventKind::Test,
            JobKind::Deploy => EventKind::Deploy,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
