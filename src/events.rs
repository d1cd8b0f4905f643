// src/events.rs

//! Lifecycle events and the sink they are delivered to.
//!
//! The dispatcher's only side effect is calling an [`EventSink`]; how events
//! reach actual subscribers lives behind that trait. [`LogSink`] is the
//! default sink used by the CLI and simply logs each event.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info};

use crate::job::JobId;

/// Routing tag selecting which notification family an event belongs to.
///
/// There is no behavioural difference between the three kinds beyond which
/// sink methods downstream subscribers see them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Build,
    Test,
    Deploy,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Build => "build",
            EventKind::Test => "test",
            EventKind::Deploy => "deploy",
        };
        f.write_str(name)
    }
}

/// Extra payload attached to a success event.
#[derive(Debug, Clone, PartialEq)]
pub enum SuccessPayload {
    /// The project directory the job ran in, echoed back (build and test).
    ProjectDir(PathBuf),
    /// Resolved tool/artifact version (deploy).
    ArtifactVersion(String),
}

/// Receiver for job lifecycle notifications.
///
/// The dispatcher makes exactly one `started` and exactly one terminal call
/// per job, in that order.
pub trait EventSink: Send + Sync {
    fn started(&self, kind: EventKind, job: &JobId);
    fn succeeded(
        &self,
        kind: EventKind,
        job: &JobId,
        output: &str,
        payload: Option<&SuccessPayload>,
    );
    fn failed(&self, kind: EventKind, job: &JobId, output: &str);
}

/// Sink that logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn started(&self, kind: EventKind, job: &JobId) {
        info!(kind = %kind, job = %job, "job started");
    }

    fn succeeded(
        &self,
        kind: EventKind,
        job: &JobId,
        output: &str,
        payload: Option<&SuccessPayload>,
    ) {
        info!(
            kind = %kind,
            job = %job,
            output_bytes = output.len(),
            ?payload,
            "job succeeded"
        );
    }

    fn failed(&self, kind: EventKind, job: &JobId, output: &str) {
        error!(kind = %kind, job = %job, "job failed: {}", output.trim_end());
    }
}
