//! SQLite channel store.
//!
//! One table, `channels`, keyed by an autoincrement integer id so ids are
//! never reused after deletion. The schema refuses empty keys.

use async_trait::async_trait;
use keyrelay_core::channel::{ChannelRecord, ChannelStatus, Scope};
use keyrelay_core::error::StoreError;
use keyrelay_core::store::{ChannelStore, Projection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use crate::missing_key_error;

const FULL_COLUMNS: &str = r#"id, type, "key", name, status, weight, base_url, models, "group",
    model_mapping, priority, config, system_prompt, created_time"#;

const REDACTED_COLUMNS: &str = r#"id, type, '' AS "key", name, status, weight, base_url, models,
    "group", model_mapping, priority, config, system_prompt, created_time"#;

/// A SQLite-backed channel store.
pub struct SqliteChannelStore {
    pool: SqlitePool,
}

impl SqliteChannelStore {
    /// Open (or create) the database at `path` with the default pool size.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        Self::with_max_connections(path, 4).await
    }

    /// Open the database with an explicit pool size.
    ///
    /// In-memory databases are private to one connection, so they always get
    /// a pool of one.
    pub async fn with_max_connections(path: &str, max_connections: u32) -> Result<Self, StoreError> {
        let in_memory = path.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite channel store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS channels (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                type           INTEGER NOT NULL DEFAULT 0,
                "key"          TEXT NOT NULL CHECK ("key" <> ''),
                name           TEXT NOT NULL DEFAULT '',
                status         INTEGER NOT NULL DEFAULT 1,
                weight         INTEGER,
                base_url       TEXT,
                models         TEXT NOT NULL DEFAULT '',
                "group"        TEXT NOT NULL DEFAULT '',
                model_mapping  TEXT,
                priority       INTEGER,
                config         TEXT NOT NULL DEFAULT '',
                system_prompt  TEXT,
                created_time   INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("channels table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_status ON channels(status)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("status index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_name ON channels(name)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("name index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `ChannelRecord` from a SQLite row.
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ChannelRecord, StoreError> {
        fn col<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, StoreError>
        where
            T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
        {
            row.try_get(name)
                .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
        }

        let status_code: i32 = col(row, "status")?;
        let status = ChannelStatus::try_from(status_code).map_err(StoreError::QueryFailed)?;

        let weight: Option<i64> = col(row, "weight")?;
        let weight = weight
            .map(u32::try_from)
            .transpose()
            .map_err(|e| StoreError::QueryFailed(format!("weight column: {e}")))?;

        Ok(ChannelRecord {
            id: col(row, "id")?,
            channel_type: col(row, "type")?,
            key: col(row, "key")?,
            name: col(row, "name")?,
            status,
            weight,
            base_url: col(row, "base_url")?,
            models: col(row, "models")?,
            group: col(row, "group")?,
            model_mapping: col(row, "model_mapping")?,
            priority: col(row, "priority")?,
            config: col(row, "config")?,
            system_prompt: col(row, "system_prompt")?,
            created_time: col(row, "created_time")?,
        })
    }

    async fn fetch_records<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        context: &str,
    ) -> Result<Vec<ChannelRecord>, StoreError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("{context}: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    /// Escape SQL LIKE wildcards so a keyword matches literally.
    fn escape_like(keyword: &str) -> String {
        keyword
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }
}

#[async_trait]
impl ChannelStore for SqliteChannelStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list(
        &self,
        offset: usize,
        limit: usize,
        scope: Scope,
    ) -> Result<Vec<ChannelRecord>, StoreError> {
        match scope {
            Scope::All => {
                let sql = format!("SELECT {FULL_COLUMNS} FROM channels ORDER BY id DESC");
                self.fetch_records(sqlx::query(&sql), "list all").await
            }
            Scope::Disabled => {
                let sql = format!(
                    "SELECT {FULL_COLUMNS} FROM channels WHERE status IN (?1, ?2) ORDER BY id DESC"
                );
                let query = sqlx::query(&sql)
                    .bind(ChannelStatus::ManuallyDisabled.code())
                    .bind(ChannelStatus::AutoDisabled.code());
                self.fetch_records(query, "list disabled").await
            }
            Scope::Limited => {
                // LIMIT -1 is SQLite's "no limit"; a negative OFFSET reads as 0
                let limit = if limit == 0 {
                    -1
                } else {
                    i64::try_from(limit).unwrap_or(i64::MAX)
                };
                let offset = i64::try_from(offset).unwrap_or(i64::MAX);
                let sql = format!(
                    "SELECT {REDACTED_COLUMNS} FROM channels ORDER BY id DESC LIMIT ?1 OFFSET ?2"
                );
                let query = sqlx::query(&sql).bind(limit).bind(offset);
                self.fetch_records(query, "list page").await
            }
        }
    }

    async fn search(&self, keyword: &str) -> Result<Vec<ChannelRecord>, StoreError> {
        let id = keyword.parse::<i64>().unwrap_or(0);
        let pattern = format!("{}%", Self::escape_like(keyword));
        let sql = format!(
            r"SELECT {REDACTED_COLUMNS} FROM channels
              WHERE id = ?1 OR name LIKE ?2 ESCAPE '\'
              ORDER BY id DESC"
        );
        let query = sqlx::query(&sql).bind(id).bind(pattern);
        self.fetch_records(query, "search").await
    }

    async fn get_by_id(&self, id: i64, projection: Projection) -> Result<ChannelRecord, StoreError> {
        let columns = match projection {
            Projection::Full => FULL_COLUMNS,
            Projection::Redacted => REDACTED_COLUMNS,
        };
        let sql = format!("SELECT {columns} FROM channels WHERE id = ?1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("GET by ID: {e}")))?;

        match row {
            Some(ref r) => Self::row_to_record(r),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn batch_insert(&self, records: Vec<ChannelRecord>) -> Result<Vec<i64>, StoreError> {
        if let Some(bad) = records.iter().find(|r| r.key.is_empty()) {
            return Err(missing_key_error(bad.id));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            let result = sqlx::query(
                r#"
                INSERT INTO channels (type, "key", name, status, weight, base_url, models, "group",
                                      model_mapping, priority, config, system_prompt, created_time)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(record.channel_type)
            .bind(&record.key)
            .bind(&record.name)
            .bind(record.status.code())
            .bind(record.weight.map(i64::from))
            .bind(&record.base_url)
            .bind(&record.models)
            .bind(&record.group)
            .bind(&record.model_mapping)
            .bind(record.priority)
            .bind(&record.config)
            .bind(&record.system_prompt)
            .bind(record.created_time)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

            ids.push(result.last_insert_rowid());
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(count = ids.len(), "Inserted channels");
        Ok(ids)
    }

    async fn update(&self, record: &ChannelRecord) -> Result<(), StoreError> {
        if record.key.is_empty() {
            return Err(missing_key_error(record.id));
        }

        let result = sqlx::query(
            r#"
            UPDATE channels SET
                type = ?1,
                "key" = ?2,
                name = ?3,
                status = ?4,
                weight = ?5,
                base_url = ?6,
                models = ?7,
                "group" = ?8,
                model_mapping = ?9,
                priority = ?10,
                config = ?11,
                system_prompt = ?12
            WHERE id = ?13
            "#,
        )
        .bind(record.channel_type)
        .bind(&record.key)
        .bind(&record.name)
        .bind(record.status.code())
        .bind(record.weight.map(i64::from))
        .bind(&record.base_url)
        .bind(&record.models)
        .bind(&record.group)
        .bind(&record.model_mapping)
        .bind(record.priority)
        .bind(&record.config)
        .bind(&record.system_prompt)
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM channels WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_all_disabled(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM channels WHERE status IN (?1, ?2)")
            .bind(ChannelStatus::ManuallyDisabled.code())
            .bind(ChannelStatus::AutoDisabled.code())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE disabled failed: {e}")))?;

        Ok(result.rows_affected())
    }
}
