// src/logstore.rs

//! Rotating store for captured-output log files.
//!
//! [`LogStore::allocate`] hands out a fresh empty file named
//! `<prefix>.<yyyy-MM-dd_HH.mm.ss>.log` inside the log directory. The
//! directory keeps at most [`MAX_LOG_FILES`] files: when an allocation would
//! exceed the cap, the file with the oldest modification time is deleted
//! first. Allocation and eviction run under one lock so two concurrent
//! allocations can neither pick the same victim nor both skip eviction.
//!
//! The store expects the directory to exist; creating it is the caller's
//! bootstrap concern.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

/// Maximum number of log files retained in the directory.
pub const MAX_LOG_FILES: usize = 5;

pub struct LogStore {
    dir: PathBuf,
    prefix: String,
    // serializes allocate+evict; the directory contents are the state
    alloc_lock: Mutex<()>,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            alloc_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create and return the path of a fresh, empty log file, evicting the
    /// oldest file first if the directory is at the cap.
    pub fn allocate(&self) -> Result<PathBuf> {
        let _guard = self.alloc_lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.current_files()?.len() >= MAX_LOG_FILES {
            self.evict_oldest()?;
        }

        let stamp = Local::now().format("%Y-%m-%d_%H.%M.%S");
        let base = format!("{}.{}", self.prefix, stamp);

        // timestamps have second resolution; disambiguate rapid allocations
        let mut path = self.dir.join(format!("{base}.log"));
        let mut seq = 0u32;
        while path.exists() {
            seq += 1;
            path = self.dir.join(format!("{base}-{seq}.log"));
        }

        fs::File::create(&path).with_context(|| format!("creating log file {path:?}"))?;
        debug!(path = ?path, "allocated log file");
        Ok(path)
    }

    fn current_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("reading log directory {:?}", self.dir))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {:?}", self.dir))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn evict_oldest(&self) -> Result<()> {
        let oldest = self.current_files()?.into_iter().min_by_key(|p| modified_time(p));
        if let Some(path) = oldest {
            fs::remove_file(&path)
                .with_context(|| format!("deleting oldest log file {path:?}"))?;
            debug!(path = ?path, "evicted oldest log file");
        }
        Ok(())
    }
}

fn modified_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
