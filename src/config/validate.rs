// src/config/validate.rs

use anyhow::{Result, anyhow};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks that the `[tool]` fields that end up in an argument vector
/// are non-empty and that the log prefix will produce sensible file names.
///
/// It does **not** check that the executable exists or is runnable; a
/// missing executable becomes a failed job at dispatch time, not a config
/// error.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.tool.executable.trim().is_empty() {
        return Err(anyhow!("[tool].executable must not be empty"));
    }
    if cfg.tool.command.trim().is_empty() {
        return Err(anyhow!("[tool].command must not be empty"));
    }
    if cfg.logs.prefix.trim().is_empty() {
        return Err(anyhow!("[logs].prefix must not be empty"));
    }
    Ok(())
}
