//! Storage module for persisting fetched videos
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent batch upsert keyed by video id
//! - Time-ordered reads with an exclusive upper bound
//! - Cancellable async access from the fetcher and the read endpoint

mod schema;
mod shared;
mod sqlite;
mod traits;

pub use shared::SharedStore;
pub use sqlite::SqliteStorage;
pub use traits::{StorageError, StorageResult, VideoStore};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A video as observed upstream, before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: String,
    pub channel_title: String,
    pub channel_id: String,
}

/// A stored video, as served by the read endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: String,
    pub channel_title: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bounded slice of the descending publish-time ordering
#[derive(Debug, Clone)]
pub struct VideoSlice {
    /// Up to the requested number of records
    pub videos: Vec<VideoRecord>,

    /// Count of all stored records, ignoring the upper bound
    pub total: u64,
}
