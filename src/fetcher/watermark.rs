//! Fetch watermark derivation
//!
//! The watermark is the earliest publish time the next cycle asks for. It is
//! derived from store state on every cycle, so a failed cycle never leaves a
//! stale value behind.

use crate::storage::{SharedStore, StorageResult, VideoStore};
use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

/// Derives the "fetch since" timestamp from the newest stored video
pub struct WatermarkTracker<S> {
    store: SharedStore<S>,
    fallback_window: Duration,
}

impl<S> WatermarkTracker<S>
where
    S: VideoStore + Send + 'static,
{
    /// Creates a tracker
    ///
    /// # Arguments
    ///
    /// * `store` - The shared video store
    /// * `fallback_window` - How far back to look when the store is empty
    pub fn new(store: SharedStore<S>, fallback_window: Duration) -> Self {
        Self {
            store,
            fallback_window,
        }
    }

    /// Returns the newest publish time plus one second, or now minus the
    /// fallback window when nothing is stored yet
    ///
    /// The extra second keeps the boundary item from being fetched again.
    pub async fn current_watermark(
        &self,
        cancel: &CancellationToken,
    ) -> StorageResult<DateTime<Utc>> {
        match self.store.latest_published_at(cancel).await? {
            Some(latest) => Ok(latest + Duration::seconds(1)),
            None => Ok(Utc::now() - self.fallback_window),
        }
    }
}
