// Presentation-side plumbing: the dispatch queue all UI mutation goes through

pub mod dispatch;

pub use dispatch::{UiAction, UiQueue, UiReceiver, ui_channel};
