// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod exec;
pub mod job;
pub mod logging;
pub mod logstore;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::dispatch::{DispatchMode, Dispatcher, DispatcherConfig};
use crate::events::LogSink;
use crate::job::{DispatchContext, Job, JobId};
use crate::logstore::LogStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - log-directory bootstrap
/// - a dispatcher with the logging sink
/// - one job built from the CLI arguments
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&args, &cfg);
        return Ok(());
    }

    let log_store = if cfg.dispatch.use_log_file {
        let dir = PathBuf::from(&cfg.logs.dir);
        fs::create_dir_all(&dir).with_context(|| format!("creating log directory {dir:?}"))?;
        Some(LogStore::new(dir, cfg.logs.prefix.clone()))
    } else {
        None
    };

    let dispatcher = Dispatcher::new(
        DispatcherConfig {
            executable: PathBuf::from(&cfg.tool.executable),
            artifact_version: cfg.tool.version.clone(),
            log_store,
        },
        Arc::new(LogSink),
    );

    let mut job = Job::new(cfg.tool.command.clone(), &args.project_dir, args.kind.into());
    if let Some(pid) = args.job_id {
        job = job.with_id(JobId::Process(pid));
    }

    let mode = if args.sync || cfg.dispatch.synchronous {
        DispatchMode::Sync
    } else {
        DispatchMode::Async
    };

    let id = dispatcher
        .submit(job, DispatchContext::generate(), mode)
        .await;
    info!(job = %id, ?mode, "job submitted");

    // let the queue drain before the process exits
    dispatcher.shutdown().await;
    Ok(())
}

/// Simple dry-run output: print the resolved settings and argument vector.
fn print_dry_run(args: &CliArgs, cfg: &ConfigFile) {
    println!("buildrelay dry-run");
    println!("  tool.executable = {}", cfg.tool.executable);
    println!("  tool.command = {}", cfg.tool.command);
    if let Some(ref version) = cfg.tool.version {
        println!("  tool.version = {version}");
    }
    println!("  dispatch.synchronous = {}", cfg.dispatch.synchronous);
    println!("  dispatch.use_log_file = {}", cfg.dispatch.use_log_file);
    println!("  logs.dir = {}", cfg.logs.dir);
    println!("  logs.prefix = {}", cfg.logs.prefix);
    println!();

    let argv: Vec<&str> = std::iter::once(cfg.tool.executable.as_str())
        .chain(cfg.tool.command.split_whitespace())
        .collect();
    println!("  would run {:?} in {}", argv, args.project_dir);

    debug!("dry-run complete (no execution)");
}
