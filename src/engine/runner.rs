// Async job runner - spawns ffmpeg/ffprobe off-thread and reports back
// through callbacks. Callbacks run on the worker thread; callers marshal
// onto their own consumer thread before touching shared state.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;

/// Latest statistics sample for a running job. Superseded by each new
/// sample; only the most recent value is ever consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    /// Output timestamp reached by the encoder, in milliseconds. The
    /// engine may report negative values before the first frame lands.
    pub elapsed_millis: i64,
}

/// Terminal result of one job, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success {
        /// Wall-clock run time of the job.
        duration_millis: u64,
    },
    Failure {
        /// Engine state at exit, e.g. "FAILED".
        state_description: String,
        /// Diagnostic trace when the engine produced one.
        fail_trace: Option<String>,
    },
}

/// Callbacks for one submission. Progress and log callbacks fire zero or
/// more times in any interleaving; completion is `FnOnce`, so a second
/// terminal report is unrepresentable.
pub struct SessionCallbacks {
    pub on_progress: Option<Box<dyn Fn(JobProgress) + Send>>,
    pub on_log: Option<Arc<dyn Fn(String) + Send + Sync>>,
    pub on_complete: Box<dyn FnOnce(JobOutcome) + Send>,
}

/// Identifier returned by a non-blocking submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Transcode,
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Completed,
    Failed,
}

/// Informational record of one submission, for diagnostics only.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: Uuid,
    pub kind: SessionKind,
    pub started_at: DateTime<Local>,
    pub state: SessionState,
    pub return_code: Option<i32>,
}

/// The opaque engine boundary. Production code talks to ffmpeg through
/// [`FfmpegRunner`]; tests script the callback sequence instead.
pub trait JobRunner: Send + Sync {
    /// Start a transcode job. Non-blocking; the job runs on a worker
    /// context the caller does not control.
    fn submit(&self, command_arguments: Vec<String>, callbacks: SessionCallbacks) -> JobHandle;

    /// Start a raw probe command. Its stdout is streamed through
    /// `on_log`; no progress events are produced.
    fn submit_probe(&self, command_arguments: Vec<String>, callbacks: SessionCallbacks)
    -> JobHandle;

    /// Snapshot of every session this runner has accepted.
    fn list_sessions(&self) -> Vec<SessionSummary>;
}

/// Parser for ffmpeg `-progress` output (key=value lines on stdout).
#[derive(Debug, Default, Clone)]
pub(crate) struct ProgressParser {
    elapsed_millis: Option<i64>,
    finished: bool,
}

impl ProgressParser {
    /// Feed one line; returns a fresh sample when the output time moved.
    pub(crate) fn parse_line(&mut self, line: &str) -> Option<JobProgress> {
        let (key, value) = line.split_once('=')?;
        match key.trim() {
            // Despite the name, out_time_ms carries microseconds too
            "out_time_us" | "out_time_ms" => {
                let us = value.trim().parse::<i64>().ok()?;
                self.advance(us / 1_000)
            }
            "progress" => {
                if value.trim() == "end" {
                    self.finished = true;
                }
                None
            }
            _ => None,
        }
    }

    pub(crate) fn finished(&self) -> bool {
        self.finished
    }

    fn advance(&mut self, millis: i64) -> Option<JobProgress> {
        if self.elapsed_millis == Some(millis) {
            return None;
        }
        self.elapsed_millis = Some(millis);
        Some(JobProgress {
            elapsed_millis: millis,
        })
    }
}

/// Runs jobs against the ffmpeg and ffprobe binaries on detached worker
/// threads, keeping an informational session registry.
pub struct FfmpegRunner {
    engine: EngineConfig,
    sessions: Arc<Mutex<Vec<SessionSummary>>>,
}

impl FfmpegRunner {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            sessions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn register(&self, kind: SessionKind) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().unwrap().push(SessionSummary {
            id,
            kind,
            started_at: Local::now(),
            state: SessionState::Running,
            return_code: None,
        });
        id
    }

    fn spawn_session(
        &self,
        id: Uuid,
        binary: String,
        args: Vec<String>,
        with_progress: bool,
        callbacks: SessionCallbacks,
    ) {
        let sessions = Arc::clone(&self.sessions);

        thread::spawn(move || {
            let mut cmd = Command::new(&binary);
            if with_progress {
                // Structured progress on stdout; logs stay on stderr
                cmd.args(["-progress", "pipe:1", "-nostats"]);
            }
            cmd.args(&args);

            debug!(session = %id, %binary, ?args, "engine process starting");

            let (outcome, return_code) = run_to_completion(cmd, with_progress, &callbacks);

            let state = match &outcome {
                JobOutcome::Success { .. } => SessionState::Completed,
                JobOutcome::Failure { .. } => SessionState::Failed,
            };
            if let Some(entry) = sessions.lock().unwrap().iter_mut().find(|s| s.id == id) {
                entry.state = state;
                entry.return_code = return_code;
            }

            debug!(session = %id, ?state, return_code, "engine process exited");

            (callbacks.on_complete)(outcome);
        });
    }
}

impl JobRunner for FfmpegRunner {
    fn submit(&self, command_arguments: Vec<String>, callbacks: SessionCallbacks) -> JobHandle {
        let id = self.register(SessionKind::Transcode);
        self.spawn_session(
            id,
            self.engine.ffmpeg_path.clone(),
            command_arguments,
            true,
            callbacks,
        );
        JobHandle { session_id: id }
    }

    fn submit_probe(
        &self,
        command_arguments: Vec<String>,
        callbacks: SessionCallbacks,
    ) -> JobHandle {
        let id = self.register(SessionKind::Probe);
        self.spawn_session(
            id,
            self.engine.ffprobe_path.clone(),
            command_arguments,
            false,
            callbacks,
        );
        JobHandle { session_id: id }
    }

    fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.lock().unwrap().clone()
    }
}

/// Drive one child process to exit: stream stdout (progress samples or
/// probe output), stream stderr as log lines while collecting it for the
/// failure trace, and fold the exit status into a terminal outcome.
fn run_to_completion(
    mut cmd: Command,
    with_progress: bool,
    callbacks: &SessionCallbacks,
) -> (JobOutcome, Option<i32>) {
    let started = Instant::now();

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return (
                JobOutcome::Failure {
                    state_description: "FAILED".into(),
                    fail_trace: Some(format!("failed to spawn engine process: {e}")),
                },
                None,
            );
        }
    };

    // Stderr drains on its own thread so a chatty encoder can never
    // deadlock against the stdout reader.
    let stderr_thread = child.stderr.take().map(|stderr| {
        let on_log = callbacks.on_log.clone();
        thread::spawn(move || {
            let mut collected = Vec::new();
            for line in BufReader::new(stderr).lines().map_while(std::io::Result::ok) {
                if let Some(on_log) = &on_log {
                    on_log(line.clone());
                }
                collected.push(line);
            }
            collected
        })
    });

    let mut parser = ProgressParser::default();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(std::io::Result::ok) {
            if with_progress {
                if let Some(sample) = parser.parse_line(&line) {
                    if let Some(on_progress) = &callbacks.on_progress {
                        on_progress(sample);
                    }
                }
            } else if let Some(on_log) = &callbacks.on_log {
                on_log(line);
            }
        }
    }
    if with_progress && !parser.finished() {
        debug!("progress stream closed without an end marker");
    }

    let status = child.wait();

    let stderr_lines = stderr_thread
        .map(|t| t.join().unwrap_or_default())
        .unwrap_or_default();

    match status {
        Ok(status) if status.success() => (
            JobOutcome::Success {
                duration_millis: started.elapsed().as_millis() as u64,
            },
            Some(0),
        ),
        Ok(status) => (
            JobOutcome::Failure {
                state_description: "FAILED".into(),
                fail_trace: failure_trace(&stderr_lines, status.code()),
            },
            status.code(),
        ),
        Err(e) => (
            JobOutcome::Failure {
                state_description: "FAILED".into(),
                fail_trace: Some(format!("failed to wait for engine process: {e}")),
            },
            None,
        ),
    }
}

/// Tail of stderr plus the exit code, or None when there is nothing to say.
fn failure_trace(stderr_lines: &[String], code: Option<i32>) -> Option<String> {
    const TRACE_LINES: usize = 20;

    if stderr_lines.is_empty() && code.is_none() {
        return None;
    }
    let tail_start = stderr_lines.len().saturating_sub(TRACE_LINES);
    let mut trace = stderr_lines[tail_start..].join("\n");
    if let Some(code) = code {
        if !trace.is_empty() {
            trace.push('\n');
        }
        trace.push_str(&format!("exit code {code}"));
    }
    Some(trace)
}
