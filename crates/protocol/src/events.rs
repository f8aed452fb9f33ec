//! One-way event surface towards the UI shell.
//!
//! The core never waits for an acknowledgement; messages are
//! fire-and-forget. The shell implements [`FrontendSink`] however it
//! likes (IPC bridge, channel, test collector).

use serde::Serialize;
use tokio::sync::mpsc;

use crate::progress::InstallProgress;
use crate::types::{GameInfo, GameStatus, Runner};

/// Kind of dialog the shell should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogType {
    Error,
}

/// Notification pushed from the core to the UI shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrontendMessage {
    #[serde(rename_all = "camelCase")]
    ProgressUpdate {
        app_name: String,
        runner: Runner,
        status: GameStatus,
        progress: InstallProgress,
    },
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        app_name: String,
        runner: Runner,
        status: GameStatus,
    },
    #[serde(rename_all = "camelCase")]
    LibraryPush { game: GameInfo },
    #[serde(rename_all = "camelCase")]
    ShowDialog {
        title: String,
        message: String,
        dialog_type: DialogType,
    },
}

/// Sink the core pushes [`FrontendMessage`]s into.
pub trait FrontendSink: Send + Sync {
    fn send(&self, message: FrontendMessage);
}

/// Sink that drops every message. Useful for headless operations.
#[derive(Debug, Default)]
pub struct NoopSink;

impl FrontendSink for NoopSink {
    fn send(&self, _message: FrontendMessage) {}
}

/// Channel-backed sink; the shell (or a test) drains the receiver.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<FrontendMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FrontendMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FrontendSink for ChannelSink {
    fn send(&self, message: FrontendMessage) {
        // Receiver gone means the shell is shutting down; nothing to do.
        let _ = self.tx.send(message);
    }
}
