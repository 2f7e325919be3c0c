use crate::SessionRecord;
use crate::backend::{Error, StorageBackend};
use sqlx::PgPool;
use time::OffsetDateTime;

// Re-export Duration
pub use tokio::time::Duration;

/// A builder for creating a `PostgresBackend`.
///
/// This allows for customizing the table and schema names for session storage.
#[derive(Debug)]
pub struct PostgresBackendBuilder {
    pool: PgPool,
    table_name: String,
    create_table: bool,
    schema_name: Option<String>,
    cleanup_interval: Option<Duration>,
}

impl PostgresBackendBuilder {
    /// Creates a new builder with a database pool and default settings.
    pub fn new(pool: PgPool, create_table: bool) -> Self {
        Self {
            pool,
            table_name: "t_sessions".to_string(),
            create_table,
            schema_name: None,
            cleanup_interval: None,
        }
    }

    /// Sets a custom table name for the session backend. Defaults to "t_sessions".
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets a custom schema name for the session backend.
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Spawns a background task that deletes expired rows every `interval`.
    ///
    /// Without this, rows are only deleted when the session store's `gc` runs.
    /// The task compares against the database clock, not the store's.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Builds the `PostgresBackend`, creating the schema and table if requested.
    pub async fn build(self) -> Result<PostgresBackend, sqlx::Error> {
        let table_name = if let Some(schema) = &self.schema_name {
            format!("\"{}\".\"{}\"", schema, self.table_name)
        } else {
            format!("\"{}\"", self.table_name)
        };

        if self.create_table {
            if let Some(schema) = &self.schema_name {
                sqlx::query(&format!("create schema if not exists \"{schema}\""))
                    .execute(&self.pool)
                    .await?;
            }

            sqlx::raw_sql(&format!(
                r#"
                create table if not exists {table_name} (
                    session_id text primary key,
                    data text not null,
                    expires_at timestamptz not null
                );
                create index if not exists idx_{index}_expires_at on {table_name}(expires_at);
                "#,
                index = self.table_name,
            ))
            .execute(&self.pool)
            .await?;
        }

        if let Some(interval) = self.cleanup_interval {
            let pool = self.pool.clone();
            let table = table_name.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    let result =
                        sqlx::query(&format!("delete from {table} where expires_at <= now()"))
                            .execute(&pool)
                            .await;

                    if let Err(err) = result {
                        tracing::error!(err = %err, "failed to sweep expired sessions");
                    }
                }
            });
        }

        Ok(PostgresBackend {
            pool: self.pool,
            table_name,
        })
    }
}

/// A Postgres-backed storage backend.
///
/// Each session is one row of `(session_id, data, expires_at)`.
#[derive(Clone, Debug)]
pub struct PostgresBackend {
    pool: PgPool,
    table_name: String,
}

impl StorageBackend for PostgresBackend {
    async fn get_by_id(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionRecord>, Error> {
        let query = format!(
            r#"
            select session_id, data, expires_at
            from {table}
            where session_id = $1
              and expires_at > $2
            "#,
            table = self.table_name
        );

        let row: Option<(String, String, OffsetDateTime)> = sqlx::query_as(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, data, expires_at)| SessionRecord::new(id, data, expires_at)))
    }

    async fn add_session(
        &self,
        id: &str,
        data: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), Error> {
        let query = format!(
            r#"
            insert into {table} (session_id, data, expires_at)
            values ($1, $2, $3)
            on conflict (session_id) do update
            set
                data = excluded.data,
                expires_at = excluded.expires_at
            "#,
            table = self.table_name
        );

        sqlx::query(&query)
            .bind(id)
            .bind(data)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_by_id(&self, id: &str) -> Result<bool, Error> {
        let query = format!(
            "delete from {table} where session_id = $1",
            table = self.table_name
        );
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_expired(&self, now: OffsetDateTime) -> Result<u64, Error> {
        let query = format!(
            "delete from {table} where expires_at <= $1",
            table = self.table_name
        );
        let result = sqlx::query(&query).bind(now).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}
