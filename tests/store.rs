mod common;

#[cfg(test)]
mod tests {
    use super::*;

    use common::*;
    use sesh::backend::MemoryBackend;
    use sesh::clock::Clock;
    use sesh::{SessionState, SessionStore, WriteError};
    use std::sync::Arc;
    use time::Duration;

    #[tokio::test]
    async fn test_memory_backend_contract() {
        assert_store_contract(Arc::new(MemoryBackend::new())).await;
    }

    #[tokio::test]
    async fn test_memory_backend_gc_uses_record_expiry() {
        assert_gc_uses_record_expiry(Arc::new(MemoryBackend::new())).await;
    }

    #[tokio::test]
    async fn test_login_scenario() {
        let (store, clock) = store_with_clock(Arc::new(MemoryBackend::new()), 3600);

        assert!(store.write("abc123", "uid=42").await);
        assert_eq!(store.read("abc123").await, "uid=42");

        clock.advance(Duration::seconds(3601));
        assert!(store.gc(0).await);
        assert_eq!(store.read("abc123").await, "");
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_empty_write_scenario() {
        let (store, _) = store_with_clock(Arc::new(MemoryBackend::new()), 3600);

        assert!(!store.write("s1", "").await);
        assert_eq!(store.read("s1").await, "");
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_expired_record_reads_empty_before_gc() {
        let (store, clock) = store_with_clock(Arc::new(MemoryBackend::new()), 10);

        assert!(store.write("s1", "uid=1").await);
        clock.advance(Duration::seconds(11));

        assert_eq!(store.read("s1").await, "");
        // still held until the sweep runs
        assert_eq!(store.backend().len(), 1);

        assert!(store.gc(10).await);
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_write_detailed_reports_expiry() {
        let (store, clock) = store_with_clock(Arc::new(MemoryBackend::new()), 3600);

        let expires_at = store.write_detailed("s1", "uid=1").await.unwrap();
        assert_eq!(expires_at, clock.now() + Duration::seconds(3600));

        assert!(matches!(
            store.write_detailed("s1", "").await,
            Err(WriteError::EmptyPayload)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_writes_last_writer_wins() {
        let (store, _) = store_with_clock(Arc::new(MemoryBackend::new()), 3600);
        let store = Arc::new(store);

        let handles = (0..16)
            .map(|n| {
                let store: Arc<SessionStore<MemoryBackend>> = Arc::clone(&store);
                tokio::spawn(async move { store.write("shared", &format!("uid={n}")).await })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(store.backend().len(), 1);
        let data = store.read("shared").await;
        assert!(data.starts_with("uid="));
    }

    #[tokio::test]
    async fn test_session_state_payload_through_store() {
        let (store, _) = store_with_clock(Arc::new(MemoryBackend::new()), 3600);
        let user = create_test_user();

        let mut state = SessionState::new();
        state.insert("user", &user).unwrap();
        assert!(store.write("s1", &state.encode().unwrap()).await);

        let state = SessionState::decode(&store.read("s1").await).unwrap();
        assert_eq!(state.get::<TestUser>("user").unwrap(), Some(user));

        // an empty state is an empty payload, which the store rejects
        assert!(!store.write("s2", &SessionState::new().encode().unwrap()).await);
    }
}
