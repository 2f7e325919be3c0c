//! Storage backends for session records.
//!
//! A [`StorageBackend`] is the persistence capability a
//! [`SessionStore`](crate::SessionStore) is constructed with. Backends only
//! move records in and out of storage; expiry stamping, payload validation and
//! the "never fail the request" policy live in the store.

use crate::SessionRecord;
use std::future::Future;
use time::OffsetDateTime;

pub mod memory;
pub use memory::MemoryBackend;

#[cfg(feature = "postgres-store")]
pub mod postgres;

#[cfg(feature = "redis-store")]
pub mod redis;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("{0}")]
    Backend(String),
}

#[cfg(feature = "postgres-store")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

#[cfg(feature = "redis-store")]
impl From<fred::error::Error> for Error {
    fn from(err: fred::error::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

/// Durable key-value storage of session records.
///
/// Implementations must be safe to call concurrently for the same `id`;
/// two racing `add_session` calls resolve as last-writer-wins.
pub trait StorageBackend: Send + Sync + 'static {
    /// Returns the record stored at `id`.
    ///
    /// Records whose expiry has already passed are reported as absent, even if
    /// they have not been swept yet.
    fn get_by_id(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> impl Future<Output = Result<Option<SessionRecord>, Error>> + Send;

    /// Inserts the record, or replaces both `data` and `expires_at` if `id`
    /// already exists.
    fn add_session(
        &self,
        id: &str,
        data: &str,
        expires_at: OffsetDateTime,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes the record stored at `id`.
    ///
    /// Returns `true` if a record was deleted.
    fn remove_by_id(&self, id: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Deletes every record whose `expires_at` is at or before `now`.
    ///
    /// Returns the number of records deleted.
    fn remove_expired(&self, now: OffsetDateTime)
    -> impl Future<Output = Result<u64, Error>> + Send;
}
