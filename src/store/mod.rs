//! The session handler contract.
//!
//! [`SessionStore`] is what a session driver calls at fixed points of a
//! request: `open` before any access, `read` to load the payload, `write` to
//! persist it, `destroy` on logout, `gc` now and then, and `close` at the end.
//! Only `write` can report failure; every other operation absorbs backend errors
//! so that a storage hiccup does not break unrelated request handling.

use crate::backend::{self, StorageBackend};
use crate::clock::{Clock, SystemClock};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

mod config;
pub use config::SessionConfig;

/// Why a write did not persist.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("refusing to persist an empty session payload")]
    EmptyPayload,

    #[error(transparent)]
    Backend(#[from] backend::Error),
}

/// A persistence-backed session handler.
///
/// The store keeps no state of its own beyond its configuration; concurrency
/// safety is the backend's concern. Two concurrent writes to the same id resolve
/// as last-writer-wins.
///
/// # Example
///
/// ```rust
/// use sesh::{SessionConfig, SessionStore};
/// use sesh::backend::MemoryBackend;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = SessionStore::new(Arc::new(MemoryBackend::new()), SessionConfig::default());
///
/// assert!(store.write("abc123", "uid=42").await);
/// assert_eq!(store.read("abc123").await, "uid=42");
///
/// assert!(!store.write("s1", "").await);
/// assert_eq!(store.read("s1").await, "");
/// # }
/// ```
#[derive(Debug)]
pub struct SessionStore<B: StorageBackend> {
    backend: Arc<B>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl<B> Clone for SessionStore<B>
where
    B: StorageBackend,
{
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<B> SessionStore<B>
where
    B: StorageBackend,
{
    pub fn new(backend: Arc<B>, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock used for expiry stamping and GC cutoffs.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Per-request setup. Nothing to prepare, so this always succeeds.
    pub fn open(&self, _save_path: &str, _session_name: &str) -> bool {
        true
    }

    /// Per-request teardown. Always succeeds.
    pub fn close(&self) -> bool {
        true
    }

    /// Returns the payload stored at `session_id`, or an empty string when there
    /// is no live session.
    ///
    /// An empty result is the normal "no session" answer. Backend failures are
    /// logged and reported the same way.
    #[tracing::instrument(name = "reading session from backend", skip(self))]
    pub async fn read(&self, session_id: &str) -> String {
        match self.backend.get_by_id(session_id, self.clock.now()).await {
            Ok(Some(record)) => record.data,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::error!(err = %err, "failed to read session from backend");
                String::new()
            }
        }
    }

    /// Persists `data` at `session_id` with a fresh expiry of now + `ttl_seconds`.
    ///
    /// Returns `false` if `data` is empty (the backend is not contacted) or if
    /// the backend write fails.
    pub async fn write(&self, session_id: &str, data: &str) -> bool {
        self.write_detailed(session_id, data).await.is_ok()
    }

    /// Like [`write`](Self::write), but reports the failure reason, or the new
    /// expiry on success.
    #[tracing::instrument(name = "writing session to backend", skip(self, data))]
    pub async fn write_detailed(
        &self,
        session_id: &str,
        data: &str,
    ) -> Result<OffsetDateTime, WriteError> {
        if data.is_empty() {
            tracing::debug!("rejecting empty session payload");
            return Err(WriteError::EmptyPayload);
        }

        let expires_at = self.expires_at(self.clock.now());
        self.backend
            .add_session(session_id, data, expires_at)
            .await
            .map_err(|err| {
                tracing::error!(err = %err, "failed to write session to backend");
                err
            })?;

        Ok(expires_at)
    }

    /// Removes the session stored at `session_id`.
    ///
    /// Always returns `true`, including when nothing was stored.
    #[tracing::instrument(name = "destroying session", skip(self))]
    pub async fn destroy(&self, session_id: &str) -> bool {
        if let Err(err) = self.backend.remove_by_id(session_id).await {
            tracing::error!(err = %err, "failed to destroy session");
        }

        true
    }

    /// Removes every record whose stored expiry has passed as of now.
    ///
    /// `max_life_time` is accepted for drivers that pass one; expiry is decided
    /// by each record's own `expires_at`. Always returns `true`.
    #[tracing::instrument(name = "collecting expired sessions", skip(self))]
    pub async fn gc(&self, max_life_time: u64) -> bool {
        match self.backend.remove_expired(self.clock.now()).await {
            Ok(removed) => tracing::debug!(removed, "collected expired sessions"),
            Err(err) => tracing::error!(err = %err, "failed to collect expired sessions"),
        }

        true
    }

    fn expires_at(&self, now: OffsetDateTime) -> OffsetDateTime {
        let ttl = i64::try_from(self.config.ttl_seconds).unwrap_or(i64::MAX);
        now.checked_add(Duration::seconds(ttl))
            .unwrap_or_else(|| time::Date::MAX.midnight().assume_utc())
    }
}
