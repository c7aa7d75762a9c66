//! Cursor-paginated reads over the video store
//!
//! Pages are newest first. Each request fetches one record more than the
//! limit to learn whether another page exists without a second query.

use crate::api::cursor::{Cursor, CursorError};
use crate::config::ServerConfig;
use crate::storage::{SharedStore, StorageError, VideoRecord, VideoStore};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while serving a page
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    InvalidCursor(#[from] CursorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One page of videos
#[derive(Debug, Clone, Serialize)]
pub struct VideoPage {
    pub videos: Vec<VideoRecord>,
    pub total: u64,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Serves paginated reads against a shared store
pub struct PaginationReader<S> {
    store: SharedStore<S>,
    default_limit: usize,
    max_limit: usize,
}

impl<S> PaginationReader<S>
where
    S: VideoStore + Send + 'static,
{
    pub fn new(store: SharedStore<S>, config: &ServerConfig) -> Self {
        Self {
            store,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Applies the default to absent or non-positive limits and caps large ones
    pub fn normalize_limit(&self, limit: Option<i64>) -> usize {
        match limit {
            Some(n) if n > 0 => usize::try_from(n)
                .unwrap_or(self.max_limit)
                .min(self.max_limit),
            _ => self.default_limit,
        }
    }

    /// Lists one page
    ///
    /// # Arguments
    ///
    /// * `cursor` - `next_cursor` from the previous page; absent or blank starts at the newest video
    /// * `limit` - Requested page size, see [`Self::normalize_limit`]
    /// * `cancel` - Cancels the store query
    ///
    /// # Returns
    ///
    /// * `Ok(VideoPage)` - The page; `total` counts every stored video regardless of cursor
    /// * `Err(ReadError::InvalidCursor)` - The cursor is not an RFC-3339 timestamp
    /// * `Err(ReadError::Storage)` - The store query failed or was cancelled
    pub async fn list(
        &self,
        cursor: Option<&str>,
        limit: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<VideoPage, ReadError> {
        let limit = self.normalize_limit(limit);
        let before = match cursor.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(Cursor::decode(raw)?.published_at()),
            None => None,
        };

        let slice = self
            .store
            .list_with_total(before, limit.saturating_add(1), cancel)
            .await?;

        let mut videos = slice.videos;
        let has_more = videos.len() > limit;
        if has_more {
            videos.truncate(limit);
        }

        let next_cursor = if has_more {
            videos
                .last()
                .map(|last| Cursor::new(last.published_at).encode())
        } else {
            None
        };

        Ok(VideoPage {
            videos,
            total: slice.total,
            limit,
            next_cursor,
            has_more,
        })
    }
}
