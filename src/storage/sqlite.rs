//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the VideoStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, VideoStore};
use crate::storage::{Video, VideoRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const UPSERT_SQL: &str = "
    INSERT INTO videos (id, title, description, published_at, thumbnail_url,
                        channel_title, channel_id, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        published_at = excluded.published_at,
        thumbnail_url = excluded.thumbnail_url,
        channel_title = excluded.channel_title,
        channel_id = excluded.channel_id,
        updated_at = excluded.updated_at
";

const SELECT_COLUMNS: &str = "id, title, description, published_at, thumbnail_url,
    channel_title, channel_id, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) a database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn micros_to_datetime(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
}

fn column_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    micros_to_datetime(micros).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    Ok(VideoRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        published_at: column_datetime(row, 3)?,
        thumbnail_url: row.get(4)?,
        channel_title: row.get(5)?,
        channel_id: row.get(6)?,
        created_at: column_datetime(row, 7)?,
        updated_at: column_datetime(row, 8)?,
    })
}

impl VideoStore for SqliteStorage {
    fn upsert_videos(&mut self, videos: &[Video]) -> StorageResult<usize> {
        let now = Utc::now().timestamp_micros();
        let tx = self.conn.transaction()?;

        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for video in videos {
                written += stmt.execute(params![
                    video.id,
                    video.title,
                    video.description,
                    video.published_at.timestamp_micros(),
                    video.thumbnail_url,
                    video.channel_title,
                    video.channel_id,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(written)
    }

    fn latest_published_at(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<i64> =
            self.conn
                .query_row("SELECT MAX(published_at) FROM videos", [], |row| row.get(0))?;

        match latest {
            Some(micros) => micros_to_datetime(micros)
                .map(Some)
                .ok_or(StorageError::InvalidTimestamp(micros)),
            None => Ok(None),
        }
    }

    fn list_videos(
        &self,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StorageResult<Vec<VideoRecord>> {
        let query = format!(
            "SELECT {} FROM videos
             WHERE (?1 IS NULL OR published_at < ?1)
             ORDER BY published_at DESC, id DESC
             LIMIT ?2",
            SELECT_COLUMNS
        );

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(&query)?;
        let videos = stmt
            .query_map(
                params![before.map(|b| b.timestamp_micros()), limit],
                row_to_record,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(videos)
    }

    fn count_videos(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_video(&self, id: &str) -> StorageResult<Option<VideoRecord>> {
        let query = format!("SELECT {} FROM videos WHERE id = ?1", SELECT_COLUMNS);
        let video = self
            .conn
            .query_row(&query, params![id], row_to_record)
            .optional()?;
        Ok(video)
    }
}
