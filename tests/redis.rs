#![cfg(feature = "redis-store")]

mod common;

#[cfg(test)]
mod tests {
    use super::*;

    use common::*;
    use fred::clients::Client;
    use fred::interfaces::ClientLike;
    use fred::types::config::Config;
    use sesh::backend::StorageBackend;
    use sesh::backend::redis::RedisBackend;
    use std::sync::Arc;
    use time::{Duration, OffsetDateTime};

    async fn setup_backend(prefix: &str) -> Arc<RedisBackend<Client>> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let config = Config::from_url(&redis_url).unwrap();
        let client = Client::new(config, None, None, None);
        client.init().await.unwrap();

        Arc::new(RedisBackend::new(Arc::new(client)).with_prefix(format!("{prefix}:{}:", unique_id())))
    }

    fn whole_micros(instant: OffsetDateTime) -> OffsetDateTime {
        instant
            .replace_nanosecond(instant.microsecond() * 1_000)
            .unwrap()
    }

    #[tokio::test]
    async fn test_store_contract() {
        assert_store_contract(setup_backend("contract").await).await;
    }

    #[tokio::test]
    async fn test_gc_uses_record_expiry() {
        assert_gc_uses_record_expiry(setup_backend("gc").await).await;
    }

    #[tokio::test]
    async fn test_upsert_replaces_expiry() {
        let backend = setup_backend("upsert").await;
        let now = whole_micros(OffsetDateTime::now_utc());
        let id = unique_id();

        backend
            .add_session(&id, "a", now + Duration::seconds(10))
            .await
            .unwrap();
        backend
            .add_session(&id, "b", now + Duration::seconds(100))
            .await
            .unwrap();

        let record = backend.get_by_id(&id, now).await.unwrap().unwrap();
        assert_eq!(record.data, "b");
        assert_eq!(record.expires_at, now + Duration::seconds(100));

        assert_eq!(
            backend
                .remove_expired(now + Duration::seconds(50))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            backend
                .remove_expired(now + Duration::seconds(100))
                .await
                .unwrap(),
            1
        );
        assert!(backend.get_by_id(&id, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_by_id_reports_deletion() {
        let backend = setup_backend("remove").await;
        let now = OffsetDateTime::now_utc();
        let id = unique_id();

        backend
            .add_session(&id, "a", now + Duration::seconds(60))
            .await
            .unwrap();
        assert!(backend.remove_by_id(&id).await.unwrap());
        assert!(!backend.remove_by_id(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_index_named_id_does_not_clobber_expiry_index() {
        let (store, clock) = store_with_clock(setup_backend("index-id").await, 60);
        let other = unique_id();

        assert!(store.write("expiry", "x").await);
        assert_eq!(store.read("expiry").await, "x");
        assert!(store.write(&other, "y").await);
        assert!(store.destroy("expiry").await);
        assert_eq!(store.read("expiry").await, "");

        clock.advance(Duration::seconds(61));
        assert!(store.gc(0).await);
        assert!(
            store
                .backend()
                .get_by_id(&other, OffsetDateTime::UNIX_EPOCH)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_sub_second_expiry_is_not_rounded_down() {
        let backend = setup_backend("subsec").await;
        let base = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
            .unwrap();
        let written_at = base + Duration::milliseconds(900);
        let id = unique_id();

        backend
            .add_session(&id, "a", written_at + Duration::seconds(10))
            .await
            .unwrap();

        // 9.5 seconds after the write, inside the same whole second as the expiry
        let later = base + Duration::milliseconds(10_400);
        let record = backend.get_by_id(&id, later).await.unwrap().unwrap();
        assert_eq!(record.expires_at, written_at + Duration::seconds(10));
        assert_eq!(backend.remove_expired(later).await.unwrap(), 0);
        assert!(backend.get_by_id(&id, later).await.unwrap().is_some());

        let due = written_at + Duration::seconds(10);
        assert!(backend.get_by_id(&id, due).await.unwrap().is_none());
        assert_eq!(backend.remove_expired(due).await.unwrap(), 1);
    }
}
