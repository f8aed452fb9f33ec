//! Playtime telemetry: session recording, delivery, and offline retry.
//!
//! A finished play session is posted to the storefront's playtime service;
//! anything but an explicit 201 enqueues the session in a durable per-user
//! queue that is drained once connectivity returns. Telemetry failures are
//! recovered locally and never surfaced to the user.

pub mod client;
pub mod queue;

pub use client::PlaytimeClient;
pub use queue::{DrainOutcome, PlaytimeQueue};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors produced by playtime delivery.
#[derive(Debug, thiserror::Error)]
pub enum PlaytimeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("playtime API returned status {status}")]
    Api { status: u16 },

    #[error(transparent)]
    Registry(#[from] gamedock_registry::RegistryError),
}

/// One recorded play session pending (or undergoing) delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaytimeSession {
    /// Session start, epoch seconds.
    pub session_date: i64,
    /// Session length in minutes.
    pub time: i64,
    #[serde(rename = "appName")]
    pub app_name: String,
}

impl PlaytimeSession {
    /// Builds a session from a play interval.
    ///
    /// Sessions under one minute are not worth recording and yield `None`.
    pub fn from_range(
        app_name: &str,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
    ) -> Option<Self> {
        let minutes = (finished - started).num_minutes();
        if minutes < 1 {
            return None;
        }
        Some(Self {
            session_date: started.timestamp(),
            time: minutes,
            app_name: app_name.to_string(),
        })
    }
}
