use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::AppError;
use crate::session::{Session, SessionPatch, SessionStore};
use crate::transport::UserId;

struct Entry {
    session: Session,
    touched: Instant,
}

/// In-process sessions with idle expiry.
///
/// One mutex guards the whole map; every operation is a single O(1) map access.
/// A session not written for `ttl` is invisible to `get` and is dropped by the
/// next sweep.
pub struct MemorySessionStore {
    entries: Mutex<HashMap<UserId, Entry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.touched) < self.ttl
    }

    /// Drops expired sessions; returns how many went.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        before - entries.len()
    }

    /// Runs `evict_expired` every `period` for the life of the process.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                let evicted = self.evict_expired();
                if evicted > 0 {
                    debug!(evicted, "expired sessions swept");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, AppError> {
        let now = Instant::now();
        Ok(self
            .lock()
            .get(&user_id)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.session.clone()))
    }

    async fn set(&self, user_id: UserId, session: Session) -> Result<(), AppError> {
        self.lock().insert(
            user_id,
            Entry {
                session,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn merge(&self, user_id: UserId, patch: SessionPatch) -> Result<Session, AppError> {
        let now = Instant::now();
        let mut entries = self.lock();
        let mut session = entries
            .remove(&user_id)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.session)
            .unwrap_or_default();
        session.apply(patch);
        entries.insert(
            user_id,
            Entry {
                session: session.clone(),
                touched: now,
            },
        );
        Ok(session)
    }

    async fn clear(&self, user_id: UserId) -> Result<(), AppError> {
        self.lock().remove(&user_id);
        Ok(())
    }
}
