//! HTTP client for the storefront playtime service.

use serde::{Deserialize, Serialize};

use crate::{PlaytimeError, PlaytimeSession};

#[derive(Serialize)]
struct SessionBody {
    session_date: i64,
    time: i64,
}

#[derive(Deserialize)]
struct PlaytimeSummary {
    time_sum: u64,
}

/// Client for `POST/GET /games/{app}/users/{user}/sessions`.
///
/// Delivery succeeds only on HTTP 201; every other outcome is an error the
/// caller converts into a queued retry.
pub struct PlaytimeClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlaytimeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn sessions_url(&self, app_name: &str, user_id: &str) -> String {
        format!(
            "{}/games/{}/users/{}/sessions",
            self.base_url, app_name, user_id
        )
    }

    /// Posts one session. Only 201 counts as delivered.
    pub async fn post_session(
        &self,
        user_id: &str,
        access_token: &str,
        session: &PlaytimeSession,
    ) -> Result<(), PlaytimeError> {
        let body = SessionBody {
            session_date: session.session_date,
            time: session.time,
        };
        let resp = self
            .http
            .post(self.sessions_url(&session.app_name, user_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 201 {
            tracing::info!(app = %session.app_name, "posted playtime session");
            Ok(())
        } else {
            tracing::debug!(app = %session.app_name, status, "failed to post playtime session");
            Err(PlaytimeError::Api { status })
        }
    }

    /// Fetches the aggregate playtime for a game, in minutes.
    pub async fn playtime(
        &self,
        app_name: &str,
        user_id: &str,
        access_token: &str,
    ) -> Result<u64, PlaytimeError> {
        let resp = self
            .http
            .get(self.sessions_url(app_name, user_id))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PlaytimeError::Api {
                status: status.as_u16(),
            });
        }

        let summary: PlaytimeSummary = resp.json().await?;
        Ok(summary.time_sum)
    }
}
