#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use ffpress::engine::{
    JobHandle, JobOutcome, JobProgress, JobRunner, SessionCallbacks, SessionSummary,
};
use uuid::Uuid;

/// One scripted engine event, replayed in order on submission.
pub enum Step {
    Progress(i64),
    Log(&'static str),
    Complete(JobOutcome),
}

/// In-process stand-in for the engine: replays a fixed callback script
/// synchronously per submission, so tests control the exact interleaving
/// the controller sees.
pub struct ScriptedRunner {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    submissions: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Runner that replays `script` for the first submission and nothing
    /// for later ones.
    pub fn new(script: Vec<Step>) -> Self {
        Self::with_scripts(vec![script])
    }

    /// Runner with one script per expected submission.
    pub fn with_scripts(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Argument vectors received so far, in submission order.
    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.submissions.lock().unwrap().clone()
    }

    fn replay(&self, command_arguments: Vec<String>, callbacks: SessionCallbacks) -> JobHandle {
        self.submissions.lock().unwrap().push(command_arguments);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        let mut on_complete = Some(callbacks.on_complete);
        for step in script {
            match step {
                Step::Progress(elapsed_millis) => {
                    if let Some(on_progress) = &callbacks.on_progress {
                        on_progress(JobProgress { elapsed_millis });
                    }
                }
                Step::Log(line) => {
                    if let Some(on_log) = &callbacks.on_log {
                        on_log(line.to_string());
                    }
                }
                Step::Complete(outcome) => {
                    if let Some(on_complete) = on_complete.take() {
                        on_complete(outcome);
                    }
                }
            }
        }

        JobHandle {
            session_id: Uuid::new_v4(),
        }
    }
}

impl JobRunner for ScriptedRunner {
    fn submit(&self, command_arguments: Vec<String>, callbacks: SessionCallbacks) -> JobHandle {
        self.replay(command_arguments, callbacks)
    }

    fn submit_probe(
        &self,
        command_arguments: Vec<String>,
        callbacks: SessionCallbacks,
    ) -> JobHandle {
        self.replay(command_arguments, callbacks)
    }

    fn list_sessions(&self) -> Vec<SessionSummary> {
        Vec::new()
    }
}

/// Create a readable dummy input video inside `dir`.
pub fn write_input(dir: &std::path::Path) -> PathBuf {
    let input = dir.join("input.mp4");
    fs::write(&input, b"not really a video").expect("write test input");
    input
}
