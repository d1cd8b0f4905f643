// src/job.rs

//! Job submission types shared between the dispatcher and the runner.

use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

use crate::events::EventKind;

/// Identifier for one submitted job.
///
/// Callers tracking an external process id supply `Process`; everyone else
/// gets a generated random token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobId {
    Process(u64),
    Token(Uuid),
}

impl JobId {
    pub fn generate() -> Self {
        JobId::Token(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Process(pid) => write!(f, "{pid}"),
            JobId::Token(token) => write!(f, "{token}"),
        }
    }
}

/// One request to run the external tool against a project directory.
///
/// `command` is a whitespace-delimited argument template (e.g.
/// `"clean compile"`), split naively at dispatch time. Arguments with
/// embedded spaces are not representable; there is no quoting or escaping.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub command: String,
    pub project_dir: PathBuf,
    pub kind: EventKind,
}

impl Job {
    /// New job with a generated token id.
    pub fn new(
        command: impl Into<String>,
        project_dir: impl Into<PathBuf>,
        kind: EventKind,
    ) -> Self {
        Self {
            id: JobId::generate(),
            command: command.into(),
            project_dir: project_dir.into(),
            kind,
        }
    }

    /// Replace the generated id with a caller-supplied one.
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }
}

/// Caller context captured at submission time.
///
/// Carried onto whichever task ends up running the job, so that event
/// emission stays attributable to the originating caller after dispatch
/// crossed a task boundary.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub correlation_id: String,
}

impl DispatchContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }

    pub fn generate() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Result of running one job.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// True iff the subprocess exited with code 0.
    pub succeeded: bool,
    /// Everything the subprocess wrote to stdout, or a failure description
    /// when the process could not be launched or waited on.
    pub output: String,
}
