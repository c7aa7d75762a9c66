//! Fetcher module for incremental background polling
//!
//! This module contains:
//! - Watermark derivation from the newest stored video
//! - The fetch cycle (watermark → upstream → store)
//! - The periodic background loop with one-shot stop

mod coordinator;
mod watermark;

pub use coordinator::{CycleReport, FetchCoordinator, FetchHandle, FetchState};
pub use watermark::WatermarkTracker;
