// src/exec/runner.rs

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::ExecError;
use crate::exec::drain;
use crate::job::Outcome;
use crate::logstore::LogStore;

/// Run `program` with `args` in `dir`, capture stdout and stderr
/// concurrently, wait for exit, and aggregate the result.
///
/// When a log store is given, a fresh log file is allocated after the child
/// has started and the stdout drain tees into it; stderr is never logged to
/// the store, only surfaced as a warning when non-empty.
///
/// The exit-wait and both drains all complete before the outcome is built;
/// returning early on any of them would truncate the captured output. Only
/// the exit code decides success.
pub async fn run(
    program: &Path,
    args: &[String],
    dir: &Path,
    log_store: Option<&LogStore>,
) -> Result<Outcome, ExecError> {
    info!(program = %program.display(), ?args, dir = %dir.display(), "running command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| ExecError::Launch {
        program: program.display().to_string(),
        dir: dir.to_path_buf(),
        source,
    })?;

    // log-file allocation failure must not abort the run
    let log_path = log_store.and_then(|store| match store.allocate() {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(error = %err, "log allocation failed; capture continues without a file");
            None
        }
    });

    // Both pipes drain on their own tasks while we wait for the exit code,
    // so a chatty child can never fill an OS pipe buffer and stall.
    let stdout_task = child
        .stdout
        .take()
        .map(|out| tokio::spawn(drain::drain(out, log_path)));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| tokio::spawn(drain::drain(err, None)));

    let status = child.wait().await.map_err(|source| ExecError::Wait {
        program: program.display().to_string(),
        source,
    })?;

    let output = join_drain(stdout_task).await;
    let stderr_output = join_drain(stderr_task).await;

    if !stderr_output.is_empty() {
        warn!(program = %program.display(), "error stream output: {}", stderr_output.trim_end());
    }

    info!(
        program = %program.display(),
        code = ?status.code(),
        success = status.success(),
        "command exited"
    );

    Ok(Outcome {
        succeeded: status.success(),
        output,
    })
}

async fn join_drain(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => match handle.await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "drain task failed");
                format!("[output lost: {err}]")
            }
        },
        None => String::new(),
    }
}
