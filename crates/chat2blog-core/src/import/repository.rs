//! Import record storage.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::model::{AssetId, ImportRecord, InsertOutcome};
use crate::Result;

const SELECT_RECORD: &str = r"
    SELECT id, media_handle, file_name, mime_type, caption, sender, chat_id,
           message_timestamp, imported_at
    FROM imported_media
";

/// Repository mapping remote media handles to imported assets.
///
/// The `media_handle` column is unique, so at most one record exists per
/// handle even when imports race.
#[derive(Debug, Clone)]
pub struct ImportRepository {
    pool: SqlitePool,
}

impl ImportRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS imported_media (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_handle TEXT NOT NULL UNIQUE,
                file_name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                caption TEXT,
                sender TEXT,
                chat_id TEXT,
                message_timestamp TEXT,
                imported_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_imported_media_chat
            ON imported_media(chat_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes the connection pool. Later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Asset ID for a media handle, if it was imported.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_asset_id(&self, media_handle: &str) -> Result<Option<AssetId>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM imported_media WHERE media_handle = ?")
                .bind(media_handle)
                .fetch_optional(&self.pool)
                .await?;
        Ok(id.map(AssetId))
    }

    /// Whether a media handle was imported.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_imported(&self, media_handle: &str) -> Result<bool> {
        Ok(self.find_asset_id(media_handle).await?.is_some())
    }

    /// Every imported media handle, oldest import first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn imported_handles(&self) -> Result<Vec<String>> {
        let handles = sqlx::query_scalar("SELECT media_handle FROM imported_media ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(handles)
    }

    /// Get a record by asset ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: AssetId) -> Result<Option<ImportRecord>> {
        let row = sqlx::query(&format!("{SELECT_RECORD} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().and_then(record_from_row))
    }

    /// Get the record for a media handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_handle(&self, media_handle: &str) -> Result<Option<ImportRecord>> {
        let row = sqlx::query(&format!("{SELECT_RECORD} WHERE media_handle = ?"))
            .bind(media_handle)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().and_then(record_from_row))
    }

    /// List records, newest import first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<ImportRecord>> {
        let rows = sqlx::query(&format!("{SELECT_RECORD} ORDER BY id DESC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().filter_map(record_from_row).collect())
    }

    /// Store a record unless its media handle is already known.
    ///
    /// The record's `id` is ignored. When another record holds the handle,
    /// nothing is written and that record's ID is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn insert_if_absent(&self, record: &ImportRecord) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r"
            INSERT INTO imported_media
                (media_handle, file_name, mime_type, caption, sender, chat_id,
                 message_timestamp, imported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(media_handle) DO NOTHING
            ",
        )
        .bind(&record.media_handle)
        .bind(&record.file_name)
        .bind(&record.mime_type)
        .bind(&record.caption)
        .bind(&record.sender)
        .bind(&record.chat_id)
        .bind(&record.message_timestamp)
        .bind(record.imported_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(InsertOutcome::Created(AssetId(result.last_insert_rowid())));
        }

        self.find_asset_id(&record.media_handle)
            .await?
            .map(InsertOutcome::Existing)
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: AssetId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM imported_media WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn record_from_row(row: &SqliteRow) -> Option<ImportRecord> {
    let imported_at: String = row.get("imported_at");
    let imported_at = DateTime::parse_from_rfc3339(&imported_at)
        .ok()?
        .with_timezone(&Utc);

    Some(ImportRecord {
        id: Some(AssetId(row.get::<i64, _>("id"))),
        media_handle: row.get("media_handle"),
        file_name: row.get("file_name"),
        mime_type: row.get("mime_type"),
        caption: row.get("caption"),
        sender: row.get("sender"),
        chat_id: row.get("chat_id"),
        message_timestamp: row.get("message_timestamp"),
        imported_at,
    })
}
