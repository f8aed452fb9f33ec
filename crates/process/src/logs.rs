//! Per-game log writers with batched, timer-driven flushing.
//!
//! A writer is created when a game launches and disposed when it stops.
//! Appended lines are queued in memory and drained by a self-rescheduling
//! flush task, bounding write latency without a dedicated thread per game.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default interval between queue drains.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Observer for settings changes that affect logging behavior.
///
/// The settings component calls this explicitly; no component mutates
/// logging state from a distance.
pub trait SettingsObserver: Send + Sync {
    fn logging_toggled(&self, disabled: bool);
}

/// Process-wide logging configuration, initialized once at startup.
#[derive(Debug, Default)]
pub struct LogConfig {
    disabled: AtomicBool,
}

impl LogConfig {
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled: AtomicBool::new(disabled),
        }
    }

    pub fn logs_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }
}

impl SettingsObserver for LogConfig {
    fn logging_toggled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
        tracing::info!(disabled, "game logging toggled");
    }
}

/// Buffered writer for one game's log file.
#[derive(Debug)]
pub struct GameLogWriter {
    path: PathBuf,
    queue: Mutex<Vec<String>>,
    stop: CancellationToken,
}

impl GameLogWriter {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            queue: Mutex::new(Vec::new()),
            stop: CancellationToken::new(),
        }
    }

    fn push(&self, line: &str) {
        self.queue.lock().unwrap().push(line.to_string());
    }

    /// Drains the queued batch to the file.
    fn flush(&self) -> std::io::Result<()> {
        let batch = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return Ok(());
            }
            std::mem::take(&mut *queue)
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for line in batch {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }
}

/// Registry of active per-game log writers, keyed by app name.
pub struct GameLogRegistry {
    config: Arc<LogConfig>,
    flush_interval: Duration,
    writers: Mutex<HashMap<String, Arc<GameLogWriter>>>,
}

impl GameLogRegistry {
    pub fn new(config: Arc<LogConfig>, flush_interval: Duration) -> Self {
        Self {
            config,
            flush_interval,
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// Opens (or returns) the writer for `app_name` and starts its flush
    /// task. Must be called from within a tokio runtime.
    pub fn open(&self, app_name: &str, path: PathBuf) -> Arc<GameLogWriter> {
        let mut writers = self.writers.lock().unwrap();
        if let Some(existing) = writers.get(app_name) {
            return Arc::clone(existing);
        }

        let writer = Arc::new(GameLogWriter::new(path));
        writers.insert(app_name.to_string(), Arc::clone(&writer));

        let task_writer = Arc::clone(&writer);
        let interval = self.flush_interval;
        let app = app_name.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_writer.stop.cancelled() => {
                        if let Err(e) = task_writer.flush() {
                            tracing::debug!(app, error = %e, "final game log flush failed");
                        }
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = task_writer.flush() {
                            tracing::debug!(app, error = %e, "game log flush failed");
                        }
                    }
                }
            }
        });

        writer
    }

    /// Queues a line for `app_name`'s log. A missing writer or disabled
    /// logging makes this a no-op.
    pub fn append(&self, app_name: &str, line: &str) {
        if self.config.logs_disabled() {
            return;
        }
        let writers = self.writers.lock().unwrap();
        if let Some(writer) = writers.get(app_name) {
            writer.push(line);
        }
    }

    /// Stops the writer for `app_name`, flushing what remains.
    pub fn close(&self, app_name: &str) {
        let writer = self.writers.lock().unwrap().remove(app_name);
        if let Some(writer) = writer {
            if let Err(e) = writer.flush() {
                tracing::debug!(app = app_name, error = %e, "game log flush on close failed");
            }
            writer.stop.cancel();
        }
    }

    pub fn is_open(&self, app_name: &str) -> bool {
        self.writers.lock().unwrap().contains_key(app_name)
    }
}
