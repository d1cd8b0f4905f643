// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [tool]
/// executable = "/usr/bin/mvn"
/// command = "clean compile"
/// version = "3.9.6"
///
/// [dispatch]
/// synchronous = false
/// use_log_file = true
///
/// [logs]
/// dir = "logs"
/// prefix = "build"
/// ```
///
/// All sections except `[tool]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// External tool settings from `[tool]`.
    pub tool: ToolSection,

    /// Execution mode defaults from `[dispatch]`.
    #[serde(default)]
    pub dispatch: DispatchSection,

    /// Log rotation settings from `[logs]`.
    #[serde(default)]
    pub logs: LogsSection,
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSection {
    /// Resolved path of the build tool executable.
    pub executable: String,

    /// Whitespace-delimited argument template, e.g. `"clean compile"`.
    pub command: String,

    /// Tool/artifact version, reported with deploy success events.
    #[serde(default)]
    pub version: Option<String>,
}

/// `[dispatch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSection {
    /// Run jobs inline on the caller instead of the background worker.
    #[serde(default)]
    pub synchronous: bool,

    /// Tee captured stdout into a rotating log file.
    #[serde(default = "default_use_log_file")]
    pub use_log_file: bool,
}

fn default_use_log_file() -> bool {
    true
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            synchronous: false,
            use_log_file: default_use_log_file(),
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    /// Directory holding the rotating log files.
    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// File name prefix, producing `<prefix>.<timestamp>.log`.
    #[serde(default = "default_log_prefix")]
    pub prefix: String,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "build".to_string()
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            prefix: default_log_prefix(),
        }
    }
}
