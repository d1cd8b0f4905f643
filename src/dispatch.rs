// src/dispatch.rs

//! Job dispatch: the public-facing engine.
//!
//! A [`Dispatcher`] owns one background worker task fed by a FIFO channel.
//! Asynchronous jobs queue behind each other and execute strictly one at a
//! time; synchronous jobs run inline on the caller's task. Either way a job
//! takes the dispatcher's run slot for the whole start-event → subprocess →
//! terminal-event sequence, so at most one subprocess runs per dispatcher
//! and events for different jobs never interleave.
//!
//! Every failure class is converted into a Failure event at this boundary;
//! an accepted job never surfaces an error to the submitter.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, warn};

use crate::events::{EventKind, EventSink, SuccessPayload};
use crate::exec;
use crate::job::{DispatchContext, Job, JobId, Outcome};
use crate::logstore::LogStore;

/// How a submitted job should be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Run inline; `submit` returns after both events have been raised.
    Sync,
    /// Queue on the background worker; `submit` returns immediately.
    Async,
}

/// Dispatcher settings, resolved and validated by the caller.
pub struct DispatcherConfig {
    /// Resolved executable path of the external tool.
    pub executable: PathBuf,
    /// Version reported as the deploy success payload, when known.
    pub artifact_version: Option<String>,
    /// Durable capture of stdout; `None` disables log files entirely.
    pub log_store: Option<LogStore>,
}

struct Shared {
    executable: PathBuf,
    artifact_version: Option<String>,
    log_store: Option<LogStore>,
    sink: Arc<dyn EventSink>,
    // held across start event -> subprocess -> terminal event
    run_slot: Mutex<()>,
}

struct QueuedJob {
    job: Job,
    ctx: DispatchContext,
}

/// Runs jobs and raises their lifecycle events.
///
/// Callers create and own an instance; there is no process-wide singleton.
pub struct Dispatcher {
    shared: Arc<Shared>,
    queue_tx: mpsc::UnboundedSender<QueuedJob>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Create a dispatcher and start its background worker.
    pub fn new(config: DispatcherConfig, sink: Arc<dyn EventSink>) -> Self {
        let shared = Arc::new(Shared {
            executable: config.executable,
            artifact_version: config.artifact_version,
            log_store: config.log_store,
            sink,
            run_slot: Mutex::new(()),
        });

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(Arc::clone(&shared), queue_rx));

        Self {
            shared,
            queue_tx,
            worker,
        }
    }

    /// Submit one job, returning its id.
    ///
    /// In `Async` mode the id is returned before the job has run; the start
    /// and terminal events fire later on the background worker.
    pub async fn submit(&self, job: Job, ctx: DispatchContext, mode: DispatchMode) -> JobId {
        let id = job.id;
        match mode {
            DispatchMode::Sync => {
                execute_job(&self.shared, job, ctx).await;
            }
            DispatchMode::Async => {
                if self.queue_tx.send(QueuedJob { job, ctx }).is_err() {
                    // only reachable once shutdown began and the worker is gone
                    warn!(job = %id, "dispatcher is shutting down; job dropped");
                }
            }
        }
        id
    }

    /// Stop accepting jobs, let the queue drain, and wait for the worker to
    /// finish.
    pub async fn shutdown(self) {
        drop(self.queue_tx);
        if let Err(err) = self.worker.await {
            warn!(error = %err, "dispatch worker did not shut down cleanly");
        }
    }
}

async fn worker_loop(shared: Arc<Shared>, mut queue_rx: mpsc::UnboundedReceiver<QueuedJob>) {
    info!("dispatch worker started");
    while let Some(QueuedJob { job, ctx }) = queue_rx.recv().await {
        execute_job(&shared, job, ctx).await;
    }
    info!("dispatch worker finished (queue closed)");
}

/// Run one job end to end: start event, subprocess, terminal event.
async fn execute_job(shared: &Shared, job: Job, ctx: DispatchContext) {
    let span = tracing::info_span!(
        "job",
        id = %job.id,
        kind = %job.kind,
        correlation = %ctx.correlation_id,
    );

    async {
        let _slot = shared.run_slot.lock().await;

        shared.sink.started(job.kind, &job.id);

        let outcome = run_job(shared, &job).await;

        if outcome.succeeded {
            let payload = success_payload(shared, &job);
            shared
                .sink
                .succeeded(job.kind, &job.id, &outcome.output, payload.as_ref());
        } else {
            shared.sink.failed(job.kind, &job.id, &outcome.output);
        }
    }
    .instrument(span)
    .await
}

/// Invoke the process runner, absorbing launch and wait failures into a
/// failed outcome so exactly one terminal event is always raised.
async fn run_job(shared: &Shared, job: &Job) -> Outcome {
    let args: Vec<String> = job.command.split_whitespace().map(str::to_string).collect();

    match exec::run(
        &shared.executable,
        &args,
        &job.project_dir,
        shared.log_store.as_ref(),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "job execution failed before an exit code");
            Outcome {
                succeeded: false,
                output: err.to_string(),
            }
        }
    }
}

fn success_payload(shared: &Shared, job: &Job) -> Option<SuccessPayload> {
    match job.kind {
        EventKind::Build | EventKind::Test => {
            Some(SuccessPayload::ProjectDir(job.project_dir.clone()))
        }
        EventKind::Deploy => shared
            .artifact_version
            .clone()
            .map(SuccessPayload::ArtifactVersion),
    }
}
