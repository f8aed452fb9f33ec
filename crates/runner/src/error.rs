//! Workflow error taxonomy.
//!
//! `Credentials` and `Validation` abort a workflow before any subprocess
//! spawns and before any registry mutation. `Aborted` is a user decision,
//! never logged as an error and never shown as a dialog. Process failures
//! carry the backend's stderr; telemetry network failures never reach
//! this type at all (they are queued locally instead).

use gamedock_launch::LaunchError;
use gamedock_process::ProcessError;
use gamedock_protocol::ValidationError;
use gamedock_registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("no valid credentials")]
    Credentials,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("operation aborted")]
    Aborted,

    #[error("game is not installed: {0}")]
    NotInstalled(String),

    #[error("install path appears deleted: {0}")]
    AppearsDeleted(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Supervisor(#[from] ProcessError),
}

impl From<ValidationError> for GameError {
    fn from(err: ValidationError) -> Self {
        GameError::Validation(err.0)
    }
}
