//! Shared, cancellable async access to a store
//!
//! The fetcher and the read endpoint hold clones of one [`SharedStore`]. Each
//! operation runs on the blocking pool under the store's mutex and is raced
//! against the caller's cancellation token.

use crate::storage::traits::{StorageError, StorageResult, VideoStore};
use crate::storage::{Video, VideoSlice};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Cloneable handle to a store shared between tasks
pub struct SharedStore<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedStore<S>
where
    S: VideoStore + Send + 'static,
{
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Runs `op` against the store on the blocking pool
    ///
    /// Returns [`StorageError::Cancelled`] as soon as `cancel` fires. The token
    /// is checked again once the lock is held, so an operation cancelled while
    /// queued behind another caller never runs.
    pub async fn with_store<T, F>(&self, cancel: &CancellationToken, op: F) -> StorageResult<T>
    where
        F: FnOnce(&mut S) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock().map_err(|_| StorageError::Poisoned)?;
            if token.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            op(&mut guard)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            joined = task => joined.map_err(|e| StorageError::Task(e.to_string()))?,
        }
    }

    pub async fn upsert_videos(
        &self,
        videos: Vec<Video>,
        cancel: &CancellationToken,
    ) -> StorageResult<usize> {
        self.with_store(cancel, move |store| store.upsert_videos(&videos))
            .await
    }

    pub async fn latest_published_at(
        &self,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<DateTime<Utc>>> {
        self.with_store(cancel, |store| store.latest_published_at())
            .await
    }

    pub async fn list_with_total(
        &self,
        before: Option<DateTime<Utc>>,
        limit: usize,
        cancel: &CancellationToken,
    ) -> StorageResult<VideoSlice> {
        self.with_store(cancel, move |store| store.list_with_total(before, limit))
            .await
    }

    pub async fn count_videos(&self, cancel: &CancellationToken) -> StorageResult<u64> {
        self.with_store(cancel, |store| store.count_videos()).await
    }
}
