//! Install/update progress parsing.
//!
//! Backend downloaders emit unstructured, interleaved log lines. This
//! parser runs a small per-game state machine over them: each line is
//! matched against a fixed set of field extractors, each field is written
//! at most once per window (first match wins), and a snapshot is emitted
//! only once every field is populated, after which the window resets.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use gamedock_protocol::InstallProgress;
use regex::Regex;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Progress: (\d+\.\d+) ").unwrap());
static ETA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ETA: (\d\d:\d\d:\d\d)").unwrap());
static DOWNLOADED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Downloaded: (\S+) MiB").unwrap());
static DOWN_SPEED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Download\t- (\S+) MiB").unwrap());
static DISK_SPEED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Disk\t- (\S+) MiB").unwrap());

/// Per-game progress accumulator.
///
/// Tolerates out-of-order, partial, and repeated lines; a later unrelated
/// line can never overwrite an already-captured field within a window.
#[derive(Debug, Default)]
pub struct ProgressParser {
    windows: Mutex<HashMap<String, InstallProgress>>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw output line for `app_name`.
    ///
    /// Returns the completed snapshot when this line fills the last missing
    /// field; the window is reset before returning.
    pub fn on_output(&self, app_name: &str, line: &str) -> Option<InstallProgress> {
        let mut windows = self.windows.lock().unwrap();
        let progress = windows.entry(app_name.to_string()).or_default();

        if progress.percent.is_none() {
            progress.percent = PERCENT
                .captures(line)
                .and_then(|c| c[1].parse::<f64>().ok());
        }

        if progress.eta.is_none() {
            progress.eta = ETA.captures(line).map(|c| c[1].to_string());
        }

        if progress.bytes.is_none() {
            progress.bytes = DOWNLOADED.captures(line).map(|c| format!("{}MB", &c[1]));
        }

        if progress.down_speed.is_none() {
            progress.down_speed = DOWN_SPEED
                .captures(line)
                .and_then(|c| c[1].parse::<f64>().ok());
        }

        if progress.disk_speed.is_none() {
            progress.disk_speed = DISK_SPEED
                .captures(line)
                .and_then(|c| c[1].parse::<f64>().ok());
        }

        if progress.is_complete() {
            let snapshot = progress.clone();
            progress.reset();
            tracing::debug!(
                app = app_name,
                percent = snapshot.percent,
                "progress window complete"
            );
            Some(snapshot)
        } else {
            None
        }
    }

    /// Drops the accumulator for `app_name`.
    pub fn reset(&self, app_name: &str) {
        self.windows.lock().unwrap().remove(app_name);
    }
}
