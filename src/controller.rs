// Job lifecycle controller - one transcode at a time, UI mutation only
// through the dispatch queue
//
// The controller is the seam between the engine's worker-thread callbacks
// and the UI thread. Callbacks update controller-owned state under a lock
// and post UiActions; they never touch user-visible state directly.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::engine::{
    self, JobHandle, JobOutcome, JobProgress, JobRunner, SessionCallbacks, command,
};
use crate::error::{Result, TranscodeError};
use crate::ui::{UiAction, UiQueue};

/// Lifecycle of the single permitted job.
///
/// `Idle -> Submitted -> Running -> {Completed, Failed}`; both terminal
/// phases re-admit the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Submitted,
    Running,
    Completed,
    Failed,
}

impl Phase {
    fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitted | Phase::Running)
    }
}

/// State owned exclusively by the active job. `latest` is the single
/// retained progress sample; each new one supersedes it.
struct ActiveJob {
    phase: Phase,
    latest: Option<JobProgress>,
    output_path: Option<PathBuf>,
}

/// Orchestrates one transcode job: builds the descriptor, hands it to the
/// engine, and turns engine callbacks into UI actions.
pub struct JobController {
    runner: Arc<dyn JobRunner>,
    ui: UiQueue,
    expected_duration_millis: u64,
    output_dir: PathBuf,
    active: Arc<Mutex<ActiveJob>>,
}

impl JobController {
    pub fn new(
        runner: Arc<dyn JobRunner>,
        ui: UiQueue,
        expected_duration_millis: u64,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            ui,
            expected_duration_millis,
            output_dir,
            active: Arc::new(Mutex::new(ActiveJob {
                phase: Phase::Idle,
                latest: None,
                output_path: None,
            })),
        }
    }

    /// Submit a transcode of `input` with the policy for `codec_label`.
    ///
    /// Rejects with [`TranscodeError::JobInFlight`] while a job is
    /// submitted or running; terminal phases accept the next submission.
    pub fn start_transcode(&self, input: &Path, codec_label: &str) -> Result<JobHandle> {
        let policy = engine::lookup(codec_label);

        let descriptor = {
            let mut active = self.active.lock().unwrap();
            if active.phase.is_in_flight() {
                return Err(TranscodeError::JobInFlight);
            }

            // A failed build leaves the previous phase untouched
            let descriptor = command::build(input, policy, &self.output_dir)?;

            active.phase = Phase::Submitted;
            active.latest = None;
            active.output_path = Some(descriptor.output_path.clone());
            descriptor
        };

        self.ui.post(UiAction::ShowProgress);

        let handle = self.runner.submit(
            descriptor.command_arguments().to_vec(),
            self.session_callbacks(),
        );
        debug!(
            session = %handle.session_id,
            codec = policy.label,
            input = %input.display(),
            "async transcode started"
        );
        Ok(handle)
    }

    /// Latest retained progress sample of the active job, if any.
    /// Superseded by each engine callback and cleared at terminal states.
    pub fn latest_progress(&self) -> Option<JobProgress> {
        self.active.lock().unwrap().latest
    }

    fn session_callbacks(&self) -> SessionCallbacks {
        let expected = self.expected_duration_millis;

        let progress_state = Arc::clone(&self.active);
        let progress_ui = self.ui.clone();
        let on_progress = Box::new(move |sample: JobProgress| {
            let mut active = progress_state.lock().unwrap();
            match active.phase {
                Phase::Submitted => active.phase = Phase::Running,
                Phase::Running => {}
                phase => {
                    warn!(?phase, "progress callback outside an active job, discarding");
                    return;
                }
            }
            active.latest = Some(sample);
            if let Some(percent) = percent_complete(sample.elapsed_millis, expected) {
                progress_ui.post(UiAction::ProgressUpdated(percent));
            }
        });

        let log_state = Arc::clone(&self.active);
        let on_log = Arc::new(move |line: String| {
            let mut active = log_state.lock().unwrap();
            match active.phase {
                Phase::Submitted => {
                    active.phase = Phase::Running;
                    debug!(engine_log = %line);
                }
                Phase::Running => debug!(engine_log = %line),
                phase => warn!(?phase, "log callback outside an active job, discarding"),
            }
        });

        let done_state = Arc::clone(&self.active);
        let done_ui = self.ui.clone();
        let on_complete = Box::new(move |outcome: JobOutcome| {
            let mut active = done_state.lock().unwrap();
            if !active.phase.is_in_flight() {
                warn!(
                    phase = ?active.phase,
                    "completion callback outside an active job, discarding"
                );
                return;
            }

            active.latest = None;
            match outcome {
                JobOutcome::Success { duration_millis } => {
                    active.phase = Phase::Completed;
                    let output_path = active.output_path.take();
                    drop(active);

                    debug!(duration_millis, "compression completed, starting playback");
                    done_ui.post(UiAction::HideProgress);
                    if let Some(path) = output_path {
                        done_ui.post(UiAction::PlaybackRequested(path));
                    }
                }
                JobOutcome::Failure {
                    state_description,
                    fail_trace,
                } => {
                    active.phase = Phase::Failed;
                    active.output_path = None;
                    drop(active);

                    done_ui.post(UiAction::HideProgress);
                    done_ui.post(UiAction::TranscodeFailed(failure_message(
                        &state_description,
                        fail_trace.as_deref(),
                    )));
                }
            }
        });

        SessionCallbacks {
            on_progress: Some(on_progress),
            on_log: Some(on_log),
            on_complete,
        }
    }
}

/// Percent complete against the configured expected duration, rounded
/// half-up. Samples before the first frame (negative time) produce no
/// display update. The fixed expected duration makes this an estimate:
/// values above 100 are allowed.
pub fn percent_complete(elapsed_millis: i64, expected_millis: u64) -> Option<u32> {
    if elapsed_millis < 0 || expected_millis == 0 {
        return None;
    }
    let elapsed = elapsed_millis as u128;
    let expected = expected_millis as u128;
    Some(((elapsed * 200 + expected) / (2 * expected)) as u32)
}

fn failure_message(state_description: &str, fail_trace: Option<&str>) -> String {
    match fail_trace {
        Some(trace) => format!("Compression failed with state {state_description}.\n{trace}"),
        None => format!("Compression failed with state {state_description}."),
    }
}
