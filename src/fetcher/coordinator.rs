//! Fetch coordinator - periodic incremental fetch orchestration
//!
//! One cycle is: derive the watermark from the store, ask the source for
//! everything published since then, and upsert the batch. The background loop
//! runs cycles on a fixed interval until stopped.

use crate::config::FetcherConfig;
use crate::fetcher::watermark::WatermarkTracker;
use crate::storage::{SharedStore, VideoStore};
use crate::upstream::VideoSource;
use crate::TubeError;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Outcome of a single fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Lower bound sent upstream
    pub watermark: DateTime<Utc>,

    /// Videos returned by the source
    pub fetched: usize,

    /// Rows written to the store
    pub stored: usize,
}

/// Lifecycle state of the background fetch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Running,
    Stopped,
}

/// Orchestrates fetch cycles against one source and one store
pub struct FetchCoordinator<C, S> {
    source: C,
    store: SharedStore<S>,
    watermark: WatermarkTracker<S>,
    query: String,
    interval: Duration,
}

impl<C, S> FetchCoordinator<C, S>
where
    C: VideoSource + 'static,
    S: VideoStore + Send + 'static,
{
    /// Creates a coordinator in the stopped state
    ///
    /// # Arguments
    ///
    /// * `source` - Where new videos come from
    /// * `store` - Where they are written
    /// * `config` - Interval and fallback window
    /// * `query` - The search term polled every cycle
    pub fn new(source: C, store: SharedStore<S>, config: &FetcherConfig, query: String) -> Self {
        let fallback_window = chrono::Duration::seconds(config.fallback_window_secs as i64);

        Self {
            source,
            watermark: WatermarkTracker::new(store.clone(), fallback_window),
            store,
            query,
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Overrides the interval between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Runs a single fetch cycle
    ///
    /// An empty upstream batch skips the write entirely.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<CycleReport, TubeError> {
        let watermark = self.watermark.current_watermark(cancel).await?;
        tracing::debug!(query = %self.query, watermark = %watermark, "Starting fetch cycle");

        let videos = self
            .source
            .fetch_since(&self.query, watermark, cancel)
            .await?;
        let fetched = videos.len();

        let stored = if videos.is_empty() {
            0
        } else {
            self.store.upsert_videos(videos, cancel).await?
        };

        Ok(CycleReport {
            watermark,
            fetched,
            stored,
        })
    }

    /// Starts the background loop and returns its handle
    ///
    /// The first cycle runs immediately. Each cycle is awaited before the next
    /// tick is taken, and ticks missed while a cycle runs are skipped, so two
    /// cycles never overlap. Failures are logged and the loop carries on.
    pub fn start(mut self) -> FetchHandle<C, S> {
        let stop = CancellationToken::new();
        let stop_signal = stop.clone();

        tracing::info!(
            query = %self.query,
            interval = ?self.interval,
            "Started background fetch"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_signal.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // The cycle gets its own token: stopping lets an in-flight cycle finish.
                let cycle = CancellationToken::new();
                match self.run_cycle(&cycle).await {
                    Ok(report) => tracing::info!(
                        fetched = report.fetched,
                        stored = report.stored,
                        watermark = %report.watermark,
                        "Fetch cycle complete"
                    ),
                    Err(e) => tracing::error!(error = %e, "Error fetching videos"),
                }
            }

            tracing::info!("Stopped background fetch");
            self
        });

        FetchHandle { stop, task }
    }
}

/// Handle to a running fetch loop
///
/// `stop` consumes the handle, so the loop can only be stopped once.
pub struct FetchHandle<C, S> {
    stop: CancellationToken,
    task: JoinHandle<FetchCoordinator<C, S>>,
}

impl<C, S> FetchHandle<C, S> {
    pub fn state(&self) -> FetchState {
        if self.task.is_finished() {
            FetchState::Stopped
        } else {
            FetchState::Running
        }
    }

    /// Signals the loop to stop and waits for it to exit
    ///
    /// No further cycles are scheduled once this is called. A cycle already in
    /// progress runs to completion first. The coordinator is handed back.
    pub async fn stop(self) -> Result<FetchCoordinator<C, S>, TubeError> {
        self.stop.cancel();
        self.task
            .await
            .map_err(|e| TubeError::Task(e.to_string()))
    }
}
