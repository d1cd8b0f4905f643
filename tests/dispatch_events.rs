use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use buildrelay::dispatch::{DispatchMode, Dispatcher, DispatcherConfig};
use buildrelay::events::{EventKind, EventSink, SuccessPayload};
use buildrelay::job::{DispatchContext, Job, JobId};
use buildrelay::logstore::LogStore;

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    Started(JobId),
    Succeeded(JobId, String, Option<SuccessPayload>),
    Failed(JobId, String),
}

impl Recorded {
    fn id(&self) -> JobId {
        match self {
            Recorded::Started(id) => *id,
            Recorded::Succeeded(id, _, _) => *id,
            Recorded::Failed(id, _) => *id,
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Recorded::Started(_))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn started(&self, _kind: EventKind, job: &JobId) {
        self.events.lock().unwrap().push(Recorded::Started(*job));
    }

    fn succeeded(
        &self,
        _kind: EventKind,
        job: &JobId,
        output: &str,
        payload: Option<&SuccessPayload>,
    ) {
        self.events.lock().unwrap().push(Recorded::Succeeded(
            *job,
            output.to_string(),
            payload.cloned(),
        ));
    }

    fn failed(&self, _kind: EventKind, job: &JobId, output: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Recorded::Failed(*job, output.to_string()));
    }
}

/// Write an executable shell script and return its path.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn dispatcher_for(executable: &Path, sink: Arc<RecordingSink>) -> Dispatcher {
    Dispatcher::new(
        DispatcherConfig {
            executable: executable.to_path_buf(),
            artifact_version: None,
            log_store: None,
        },
        sink,
    )
}

#[tokio::test]
async fn sync_submission_raises_start_then_success_before_returning() -> TestResult {
    let dir = tempdir()?;
    let script = write_script(dir.path(), "tool.sh", "echo BUILD SUCCESS");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&script, Arc::clone(&sink));

    let job = Job::new("clean compile", dir.path(), EventKind::Build);
    let id = job.id;
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    // sync mode: both events exist by the time submit returned
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Recorded::Started(id));
    match &events[1] {
        Recorded::Succeeded(event_id, output, payload) => {
            assert_eq!(*event_id, id);
            assert!(output.contains("SUCCESS"), "output was {output:?}");
            assert_eq!(
                payload.as_ref(),
                Some(&SuccessPayload::ProjectDir(dir.path().to_path_buf()))
            );
        }
        other => panic!("expected success event, got {other:?}"),
    }

    dispatcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_raises_failure_with_captured_output() -> TestResult {
    let dir = tempdir()?;
    let script = write_script(dir.path(), "tool.sh", "echo compilation error\nexit 1");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&script, Arc::clone(&sink));

    let job = Job::new("clean compile", dir.path(), EventKind::Build);
    let id = job.id;
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Recorded::Started(id));
    match &events[1] {
        Recorded::Failed(event_id, output) => {
            assert_eq!(*event_id, id);
            assert!(output.contains("compilation error"), "output was {output:?}");
        }
        other => panic!("expected failure event, got {other:?}"),
    }

    dispatcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn missing_executable_becomes_failure_event_not_error() -> TestResult {
    let dir = tempdir()?;
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&dir.path().join("no-such-tool"), Arc::clone(&sink));

    let job = Job::new("clean compile", dir.path(), EventKind::Build);
    let id = job.id;
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Recorded::Started(id));
    match &events[1] {
        Recorded::Failed(event_id, output) => {
            assert_eq!(*event_id, id);
            assert!(output.contains("no-such-tool"), "output was {output:?}");
        }
        other => panic!("expected failure event, got {other:?}"),
    }

    dispatcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn async_submission_returns_before_terminal_event() -> TestResult {
    let dir = tempdir()?;
    let script = write_script(dir.path(), "tool.sh", "sleep 0.3\necho done");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&script, Arc::clone(&sink));

    let job = Job::new("clean compile", dir.path(), EventKind::Build);
    let id = job.id;
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Async)
        .await;

    // the job sleeps 300ms, so no terminal event can exist yet
    assert!(
        sink.events().iter().all(|e| !e.is_terminal()),
        "terminal event before the job could have finished"
    );

    dispatcher.shutdown().await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Recorded::Started(id));
    assert!(matches!(&events[1], Recorded::Succeeded(event_id, _, _) if *event_id == id));
    Ok(())
}

#[tokio::test]
async fn async_jobs_serialize_in_submission_order() -> TestResult {
    let dir = tempdir()?;
    let slow = write_script(dir.path(), "slow.sh", "sleep 0.3\necho A done");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&slow, Arc::clone(&sink));

    let job_a = Job::new("clean compile", dir.path(), EventKind::Build);
    let job_b = Job::new("clean compile", dir.path(), EventKind::Test);
    let id_a = job_a.id;
    let id_b = job_b.id;

    dispatcher
        .submit(job_a, DispatchContext::generate(), DispatchMode::Async)
        .await;
    dispatcher
        .submit(job_b, DispatchContext::generate(), DispatchMode::Async)
        .await;
    dispatcher.shutdown().await;

    let events = sink.events();
    assert_eq!(events.len(), 4);
    // B's start must never come before A's terminal event
    assert_eq!(events[0], Recorded::Started(id_a));
    assert!(events[1].is_terminal() && events[1].id() == id_a);
    assert_eq!(events[2], Recorded::Started(id_b));
    assert!(events[3].is_terminal() && events[3].id() == id_b);
    Ok(())
}

#[tokio::test]
async fn caller_supplied_process_id_tags_all_events() -> TestResult {
    let dir = tempdir()?;
    let script = write_script(dir.path(), "tool.sh", "echo ok");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_for(&script, Arc::clone(&sink));

    let job = Job::new("clean compile", dir.path(), EventKind::Build).with_id(JobId::Process(4711));
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    let events = sink.events();
    assert!(events.iter().all(|e| e.id() == JobId::Process(4711)));

    dispatcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn deploy_success_carries_artifact_version() -> TestResult {
    let dir = tempdir()?;
    let script = write_script(dir.path(), "tool.sh", "echo deployed");
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Dispatcher::new(
        DispatcherConfig {
            executable: script,
            artifact_version: Some("3.9.6".to_string()),
            log_store: None,
        },
        sink.clone(),
    );

    let job = Job::new("deploy", dir.path(), EventKind::Deploy);
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    let events = sink.events();
    match &events[1] {
        Recorded::Succeeded(_, _, payload) => {
            assert_eq!(
                payload.as_ref(),
                Some(&SuccessPayload::ArtifactVersion("3.9.6".to_string()))
            );
        }
        other => panic!("expected success event, got {other:?}"),
    }

    dispatcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn log_file_matches_reported_output_byte_for_byte() -> TestResult {
    let dir = tempdir()?;
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs)?;
    let script = write_script(dir.path(), "tool.sh", "echo line one\necho line two");

    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Dispatcher::new(
        DispatcherConfig {
            executable: script,
            artifact_version: None,
            log_store: Some(LogStore::new(&logs, "build")),
        },
        sink.clone(),
    );

    let job = Job::new("clean compile", dir.path(), EventKind::Build);
    dispatcher
        .submit(job, DispatchContext::generate(), DispatchMode::Sync)
        .await;

    let events = sink.events();
    let output = match &events[1] {
        Recorded::Succeeded(_, output, _) => output.clone(),
        other => panic!("expected success event, got {other:?}"),
    };
    assert_eq!(output, "line one\nline two\n");

    let files: Vec<PathBuf> = fs::read_dir(&logs)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    assert_eq!(files.len(), 1, "expected exactly one new log file");
    assert_eq!(fs::read(&files[0])?, output.as_bytes());

    dispatcher.shutdown().await;
    Ok(())
}
