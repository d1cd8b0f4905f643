// src/errors.rs

//! Crate-wide error types.
//!
//! Application-level wiring (config loading, bootstrap) uses `anyhow`;
//! [`ExecError`] covers the failure classes that abort a subprocess run
//! before an exit code exists. Drain and log-rotation failures degrade in
//! place and never surface through these types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use anyhow::{Error, Result};

/// Failure to obtain an exit code for a spawned command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The child process could not be started at all (missing executable,
    /// invalid working directory, permissions).
    #[error("failed to launch '{program}' in {dir:?}: {source}")]
    Launch {
        program: String,
        dir: PathBuf,
        source: io::Error,
    },

    /// The child was started but waiting on its exit failed.
    #[error("failed while waiting for '{program}': {source}")]
    Wait { program: String, source: io::Error },
}
