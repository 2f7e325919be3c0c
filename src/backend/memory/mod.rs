use crate::SessionRecord;
use crate::backend::{Error, StorageBackend};
use dashmap::DashMap;
use time::OffsetDateTime;

/// An in-memory storage backend.
///
/// Records live in a [`DashMap`] keyed by session id, so upserts and deletes on
/// a single id are atomic with respect to each other.
///
/// ### Note
///
/// Records do not survive a restart. Do not use this in a production environment.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: DashMap<String, SessionRecord>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of records held, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    async fn get_by_id(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionRecord>, Error> {
        Ok(self
            .records
            .get(id)
            .filter(|record| !record.is_expired(now))
            .map(|record| record.value().clone()))
    }

    async fn add_session(
        &self,
        id: &str,
        data: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), Error> {
        self.records
            .insert(id.to_string(), SessionRecord::new(id, data, expires_at));
        Ok(())
    }

    async fn remove_by_id(&self, id: &str) -> Result<bool, Error> {
        Ok(self.records.remove(id).is_some())
    }

    async fn remove_expired(&self, now: OffsetDateTime) -> Result<u64, Error> {
        let mut removed = 0;
        self.records.retain(|_, record| {
            let expired = record.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        Ok(removed)
    }
}
