mod lua;

use crate::SessionRecord;
use crate::backend::redis::lua::{
    ADD_SESSION_SCRIPT, ADD_SESSION_SCRIPT_HASH, REMOVE_EXPIRED_SCRIPT,
    REMOVE_EXPIRED_SCRIPT_HASH, REMOVE_SESSION_SCRIPT, REMOVE_SESSION_SCRIPT_HASH,
};
use crate::backend::{Error, StorageBackend};
use fred::clients::Pool;
use fred::interfaces::HashesInterface;
use fred::prelude::LuaInterface;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::OnceCell;

/// A redis storage backend.
///
/// Each session is a hash at `{prefix}record:{id}` holding `data` and
/// `expires_at` (unix microseconds). A sorted set at `{prefix}expiry` scores every
/// id by its expiry so that `remove_expired` can find due records without
/// scanning the keyspace. Record keys never collide with the index, whatever
/// the id.
/// Writes and sweeps run as Lua scripts so the hash and the index never disagree.
///
/// Keys are not given a redis TTL; expired records are only deleted by
/// `remove_expired`.
#[derive(Clone, Debug)]
pub struct RedisBackend<C: HashesInterface + LuaInterface + Clone + Send + Sync = Pool>
{
    client: Arc<C>,
    prefix: String,
}

impl<C> RedisBackend<C>
where
    C: HashesInterface + LuaInterface + Clone + Send + Sync,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            prefix: "sesh:".to_string(),
        }
    }

    /// Sets the prefix for every key this backend writes. Defaults to `"sesh:"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn record_prefix(&self) -> String {
        format!("{}record:", self.prefix)
    }

    fn record_key(&self, id: &str) -> String {
        format!("{}{}", self.record_prefix(), id)
    }

    fn index_key(&self) -> String {
        format!("{}expiry", self.prefix)
    }
}

impl<C> StorageBackend for RedisBackend<C>
where
    C: HashesInterface + LuaInterface + Clone + Send + Sync + 'static,
{
    async fn get_by_id(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionRecord>, Error> {
        let fields = self
            .client
            .hgetall::<HashMap<String, String>, _>(self.record_key(id))
            .await?;

        let (Some(data), Some(expires_at)) = (fields.get("data"), fields.get("expires_at")) else {
            return Ok(None);
        };

        let expires_at = expires_at
            .parse::<i64>()
            .map_err(|err| Error::Decode(err.to_string()))
            .and_then(from_micros)?;

        let record = SessionRecord::new(id, data.as_str(), expires_at);
        if record.is_expired(now) {
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn add_session(
        &self,
        id: &str,
        data: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), Error> {
        let hash = load_script(&self.client, &ADD_SESSION_SCRIPT_HASH, ADD_SESSION_SCRIPT).await?;

        let _: i64 = self
            .client
            .evalsha(
                hash,
                vec![self.record_key(id), self.index_key()],
                vec![
                    id.to_string(),
                    data.to_string(),
                    expiry_micros(expires_at).to_string(),
                ],
            )
            .await?;

        Ok(())
    }

    async fn remove_by_id(&self, id: &str) -> Result<bool, Error> {
        let hash =
            load_script(&self.client, &REMOVE_SESSION_SCRIPT_HASH, REMOVE_SESSION_SCRIPT).await?;

        let deleted: i64 = self
            .client
            .evalsha(
                hash,
                vec![self.record_key(id), self.index_key()],
                id.to_string(),
            )
            .await?;

        Ok(deleted > 0)
    }

    async fn remove_expired(&self, now: OffsetDateTime) -> Result<u64, Error> {
        let hash =
            load_script(&self.client, &REMOVE_EXPIRED_SCRIPT_HASH, REMOVE_EXPIRED_SCRIPT).await?;

        let deleted: i64 = self
            .client
            .evalsha(
                hash,
                vec![self.index_key()],
                vec![self.record_prefix(), cutoff_micros(now).to_string()],
            )
            .await?;

        Ok(deleted.max(0) as u64)
    }
}

// Expiries round up and cutoffs round down to whole microseconds, so a record
// is never treated as expired before its own instant.
fn expiry_micros(instant: OffsetDateTime) -> i64 {
    let nanos = instant.unix_timestamp_nanos();
    (-(-nanos).div_euclid(1_000)) as i64
}

fn cutoff_micros(instant: OffsetDateTime) -> i64 {
    instant.unix_timestamp_nanos().div_euclid(1_000) as i64
}

fn from_micros(micros: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(|err| Error::Decode(err.to_string()))
}

async fn load_script<'a, C>(
    client: &Arc<C>,
    once_cell: &'a OnceCell<String>,
    script: &str,
) -> Result<&'a String, fred::error::Error>
where
    C: LuaInterface + Clone + Send + Sync,
{
    once_cell
        .get_or_try_init(|| async {
            let hash = fred::util::sha1_hash(script);
            if !client.script_exists::<bool, _>(&hash).await? {
                let _: () = client.script_load(script).await?;
            }
            Ok::<String, fred::error::Error>(hash)
        })
        .await
}
