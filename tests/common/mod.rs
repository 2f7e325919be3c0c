#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use sesh::backend::StorageBackend;
use sesh::clock::{Clock, MockClock};
use sesh::{CookieOptions, Id, SessionConfig, SessionStore};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestUser {
    pub uid: i64,
    pub name: String,
    pub extend: String,
}

pub fn create_test_user() -> TestUser {
    TestUser {
        uid: 42,
        name: "Test User".to_string(),
        extend: "{}".to_string(),
    }
}

pub fn build_cookie_options() -> CookieOptions {
    CookieOptions::build()
        .name("test_sess")
        .http_only(true)
        .same_site(cookie::SameSite::Lax)
        .secure(true)
        .max_age(15)
        .path("/")
}

/// A store over `backend` whose clock only moves when the test says so.
///
/// The clock starts at the current wall time, sub-second part included, so
/// that backends with their own notion of time still see plausible timestamps.
pub fn store_with_clock<B: StorageBackend>(
    backend: Arc<B>,
    ttl_seconds: u64,
) -> (SessionStore<B>, MockClock) {
    let clock = MockClock::new(OffsetDateTime::now_utc());
    let store = SessionStore::new(backend, SessionConfig::build().ttl_seconds(ttl_seconds))
        .with_clock(Arc::new(clock.clone()));
    (store, clock)
}

pub fn unique_id() -> String {
    Id::default().to_string()
}

/// Checks the session handler contract against any backend.
pub async fn assert_store_contract<B: StorageBackend>(backend: Arc<B>) {
    let (store, clock) = store_with_clock(backend, 3600);

    // write then read returns the payload
    let id = unique_id();
    assert!(store.write(&id, "uid=42").await);
    assert_eq!(store.read(&id).await, "uid=42");

    // overwriting replaces the payload
    assert!(store.write(&id, "uid=43").await);
    assert_eq!(store.read(&id).await, "uid=43");

    // a rejected write leaves the stored record alone
    assert!(!store.write(&id, "").await);
    assert_eq!(store.read(&id).await, "uid=43");

    // never-written and never-created ids read as empty
    let missing = unique_id();
    assert_eq!(store.read(&missing).await, "");
    assert!(!store.write(&missing, "").await);
    assert_eq!(store.read(&missing).await, "");

    // destroy is idempotent
    assert!(store.destroy(&id).await);
    assert_eq!(store.read(&id).await, "");
    assert!(store.destroy(&id).await);
    assert!(store.destroy(&missing).await);
    assert_eq!(store.read(&missing).await, "");

    // gc keeps records younger than the ttl
    let young = unique_id();
    assert!(store.write(&young, "uid=1").await);
    clock.advance(Duration::seconds(3599));
    assert!(store.gc(0).await);
    assert_eq!(store.read(&young).await, "uid=1");

    // and removes them once the ttl has passed
    clock.advance(Duration::seconds(2));
    assert!(store.gc(0).await);
    assert_eq!(store.read(&young).await, "");
}

/// The GC sweep removes only records whose own expiry has passed.
pub async fn assert_gc_uses_record_expiry<B: StorageBackend>(backend: Arc<B>) {
    let (store, clock) = store_with_clock(backend, 60);

    let stale = unique_id();
    let refreshed = unique_id();
    assert!(store.write(&stale, "a").await);
    assert!(store.write(&refreshed, "b").await);

    clock.advance(Duration::seconds(45));
    assert!(store.write(&refreshed, "b2").await);

    clock.advance(Duration::seconds(30));
    // max_life_time is ignored: 1 second would otherwise collect both.
    assert!(store.gc(1).await);
    assert_eq!(store.read(&stale).await, "");
    assert_eq!(store.read(&refreshed).await, "b2");

    let now = clock.now();
    assert!(store.backend().get_by_id(&stale, now).await.unwrap().is_none());
}
