//! Process supervision for backend CLI tools.
//!
//! Spawns a backend executable with piped output, streams stdout lines to a
//! callback (and best-effort to a log file), maps the exit status to a
//! normalized [`ExecResult`](gamedock_protocol::ExecResult), and supports
//! cancellation by logical operation id through the [`AbortRegistry`].

pub mod abort;
pub mod logs;
pub mod supervisor;

pub use abort::AbortRegistry;
pub use logs::{GameLogRegistry, LogConfig, SettingsObserver};
pub use supervisor::{CommandOptions, run_command};

/// Errors produced by the process supervisor.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// A second operation was requested for an id that already has a live
    /// subprocess. Requests are rejected, never queued.
    #[error("an operation is already running for {0}")]
    AlreadyRunning(String),

    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
