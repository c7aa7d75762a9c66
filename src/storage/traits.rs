//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Video, VideoRecord, VideoSlice};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Storage task failed: {0}")]
    Task(String),

    #[error("Storage operation cancelled")]
    Cancelled,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Records are ordered by publish time descending, ties broken by id descending.
pub trait VideoStore {
    /// Inserts or updates a batch of videos in a single transaction
    ///
    /// Re-observed ids update their attributes and `updated_at` while keeping
    /// the original `created_at`. Either the whole batch is written or none of it.
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn upsert_videos(&mut self, videos: &[Video]) -> StorageResult<usize>;

    /// Gets the publish timestamp of the most recently published video
    fn latest_published_at(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Lists videos strictly older than `before` (or all videos when `None`),
    /// newest first, at most `limit` of them
    fn list_videos(
        &self,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StorageResult<Vec<VideoRecord>>;

    /// Counts all stored videos
    fn count_videos(&self) -> StorageResult<u64>;

    /// Gets a single video by id
    fn get_video(&self, id: &str) -> StorageResult<Option<VideoRecord>>;

    /// Lists a page and counts the full set against one consistent view
    fn list_with_total(
        &self,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StorageResult<VideoSlice> {
        let videos = self.list_videos(before, limit)?;
        let total = self.count_videos()?;
        Ok(VideoSlice { videos, total })
    }
}
