//! Durable offline retry queue for playtime sessions.

use std::path::PathBuf;

use gamedock_registry::KeyedStore;

use crate::{PlaytimeError, PlaytimeSession};

/// Reserved key marking a drain in progress.
///
/// A drain that finds the marker present exits immediately without a
/// single network call; the marker is removed when the drain finishes.
const LOCK_KEY: &str = "lock";

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain holds the lock; nothing was attempted.
    Locked,
    Drained { delivered: usize, kept: usize },
}

/// Per-user durable queue of sessions awaiting delivery.
///
/// Items are append-only until delivered; a drain removes exactly the
/// sessions the service acknowledged and keeps the rest.
pub struct PlaytimeQueue {
    store: KeyedStore<Vec<PlaytimeSession>>,
}

impl PlaytimeQueue {
    pub fn load(path: PathBuf) -> Result<Self, PlaytimeError> {
        Ok(Self {
            store: KeyedStore::load(path)?,
        })
    }

    /// Appends a session to the user's queue.
    pub fn enqueue(&self, user_id: &str, session: PlaytimeSession) -> Result<(), PlaytimeError> {
        let mut queue = self.store.get_or(user_id, Vec::new());
        queue.push(session);
        self.store.set(user_id, queue)?;
        Ok(())
    }

    pub fn pending(&self, user_id: &str) -> Vec<PlaytimeSession> {
        self.store.get_or(user_id, Vec::new())
    }

    pub fn is_locked(&self) -> bool {
        self.store.has(LOCK_KEY)
    }

    /// Drains the user's queue through `deliver`.
    ///
    /// `deliver` returns whether the session was acknowledged; sessions it
    /// rejects stay queued for the next pass. Exactly one drain runs at a
    /// time, guarded by the durable lock marker.
    pub async fn drain<F, Fut>(
        &self,
        user_id: &str,
        mut deliver: F,
    ) -> Result<DrainOutcome, PlaytimeError>
    where
        F: FnMut(PlaytimeSession) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.store.has(LOCK_KEY) {
            tracing::debug!("playtime drain already in progress, skipping");
            return Ok(DrainOutcome::Locked);
        }

        let queue = self.store.get_or(user_id, Vec::new());
        if queue.is_empty() {
            return Ok(DrainOutcome::Drained {
                delivered: 0,
                kept: 0,
            });
        }

        self.store.set(LOCK_KEY, Vec::new())?;

        let mut kept = Vec::new();
        let mut delivered = 0usize;
        for session in queue {
            if deliver(session.clone()).await {
                delivered += 1;
            } else {
                kept.push(session);
            }
        }

        let kept_count = kept.len();
        self.store.set(user_id, kept)?;
        self.store.remove(LOCK_KEY)?;

        tracing::info!(delivered, kept = kept_count, "finished playtime queue drain");
        Ok(DrainOutcome::Drained {
            delivered,
            kept: kept_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(app: &str, date: i64) -> PlaytimeSession {
        PlaytimeSession {
            session_date: date,
            time: 10,
            app_name: app.into(),
        }
    }

    fn queue() -> (tempfile::TempDir, PlaytimeQueue) {
        let dir = tempfile::tempdir().unwrap();
        let queue = PlaytimeQueue::load(dir.path().join("playtime-queue.json")).unwrap();
        (dir, queue)
    }

    #[tokio::test]
    async fn drain_removes_only_delivered() {
        let (_dir, queue) = queue();
        queue.enqueue("user", session("a", 1)).unwrap();
        queue.enqueue("user", session("b", 2)).unwrap();
        queue.enqueue("user", session("c", 3)).unwrap();

        // "b" is rejected, the others acknowledged.
        let outcome = queue
            .drain("user", |s| async move { s.app_name != "b" })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                delivered: 2,
                kept: 1
            }
        );
        let pending = queue.pending("user");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].app_name, "b");
        assert!(!queue.is_locked());
    }

    #[tokio::test]
    async fn locked_drain_makes_zero_delivery_calls() {
        let (_dir, queue) = queue();
        queue.enqueue("user", session("a", 1)).unwrap();
        queue.store.set(LOCK_KEY, Vec::new()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let outcome = queue
            .drain("user", |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { true }
            })
            .await
            .unwrap();

        assert_eq!(outcome, DrainOutcome::Locked);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(queue.pending("user").len(), 1);
    }

    #[tokio::test]
    async fn empty_queue_drain_is_noop() {
        let (_dir, queue) = queue();
        let outcome = queue.drain("user", |_| async { true }).await.unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                delivered: 0,
                kept: 0
            }
        );
        assert!(!queue.is_locked());
    }

    #[tokio::test]
    async fn enqueue_increments_by_one() {
        let (_dir, queue) = queue();
        queue.enqueue("user", session("a", 1)).unwrap();
        assert_eq!(queue.pending("user").len(), 1);
        queue.enqueue("user", session("a", 2)).unwrap();
        assert_eq!(queue.pending("user").len(), 2);
        // Other users' queues are untouched.
        assert!(queue.pending("other").is_empty());
    }

    #[tokio::test]
    async fn queues_are_per_user() {
        let (_dir, queue) = queue();
        queue.enqueue("alice", session("a", 1)).unwrap();
        queue.enqueue("bob", session("b", 1)).unwrap();

        queue.drain("alice", |_| async { true }).await.unwrap();
        assert!(queue.pending("alice").is_empty());
        assert_eq!(queue.pending("bob").len(), 1);
    }
}
