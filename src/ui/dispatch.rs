// Single-consumer dispatch queue for UI mutation
//
// Producers live on arbitrary worker threads; the receiver is drained by
// exactly one designated thread, and that drain loop is the only place
// user-visible state may change. No locks: the channel is the whole
// serialization discipline.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

/// One unit of UI work. Everything a background callback wants shown to
/// the user travels through this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Show the busy indicator for a freshly submitted job.
    ShowProgress,
    /// Refresh the percent-complete display (latest wins).
    ProgressUpdated(u32),
    /// Dismiss the busy indicator.
    HideProgress,
    /// Job succeeded; start playback of the compressed artifact.
    PlaybackRequested(PathBuf),
    /// Job failed; surface the message to the user.
    TranscodeFailed(String),
    /// Append one line of raw command output.
    OutputAppended(String),
    /// A raw command finished; message describes the exit.
    CommandFinished { success: bool, message: String },
}

/// Cloneable producer handle. `post` is the only way background code may
/// affect the UI.
#[derive(Clone)]
pub struct UiQueue {
    tx: Sender<UiAction>,
}

impl UiQueue {
    /// Enqueue a UI task. Dropped silently if the consumer is gone,
    /// matching a dismissed screen ignoring stale callbacks.
    pub fn post(&self, action: UiAction) {
        let _ = self.tx.send(action);
    }
}

/// Consumer half. Not `Sync`: binding it to one thread is what makes the
/// queue single-consumer.
pub struct UiReceiver {
    rx: Receiver<UiAction>,
}

impl UiReceiver {
    /// Block until the next action, or `None` once every producer hung up.
    pub fn next(&self) -> Option<UiAction> {
        self.rx.recv().ok()
    }

    /// Drain without blocking; used by tests to assert action sequences.
    pub fn drained(&self) -> Vec<UiAction> {
        self.rx.try_iter().collect()
    }
}

/// Create a connected producer/consumer pair. Unbounded: a flood of
/// progress events accumulates rather than blocking the worker.
pub fn ui_channel() -> (UiQueue, UiReceiver) {
    let (tx, rx) = mpsc::channel();
    (UiQueue { tx }, UiReceiver { rx })
}
