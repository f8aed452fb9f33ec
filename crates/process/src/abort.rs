//! Cancellation routing: one live handle per logical operation id.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::ProcessError;

/// Maps a logical operation id (normally the game's app name) to the
/// cancellation handle of exactly one in-flight subprocess.
///
/// Registering an id that is already present is rejected; the entry is
/// removed unconditionally when the subprocess exits, whatever the outcome.
#[derive(Debug, Default)]
pub struct AbortRegistry {
    inner: Mutex<HashMap<String, CancellationToken>>,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` and returns its cancellation token.
    ///
    /// Fails with [`ProcessError::AlreadyRunning`] if a live entry exists.
    pub fn register(&self, id: &str) -> Result<CancellationToken, ProcessError> {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(id) {
            return Err(ProcessError::AlreadyRunning(id.to_string()));
        }
        let token = CancellationToken::new();
        map.insert(id.to_string(), token.clone());
        Ok(token)
    }

    /// Requests cancellation of the operation registered under `id`.
    ///
    /// Returns whether an entry was present. The entry itself is removed by
    /// the supervisor once the process has exited.
    pub fn abort(&self, id: &str) -> bool {
        let map = self.inner.lock().unwrap();
        match map.get(id) {
            Some(token) => {
                tracing::info!(id, "abort requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `id`, if any.
    pub fn finish(&self, id: &str) {
        self.inner.lock().unwrap().remove(id);
    }

    /// Whether an operation is currently registered under `id`.
    pub fn is_active(&self, id: &str) -> bool {
        self.inner.lock().unwrap().contains_key(id)
    }
}
