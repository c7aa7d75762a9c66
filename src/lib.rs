//! Tubewatch: an incremental video-search poller
//!
//! This crate polls a video-search API for new results matching a fixed query,
//! persists each newly discovered video, and serves the collection back through
//! a cursor-paginated HTTP endpoint.

pub mod api;
pub mod config;
pub mod fetcher;
pub mod storage;
pub mod upstream;

use thiserror::Error;

/// Main error type for Tubewatch operations
#[derive(Debug, Error)]
pub enum TubeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] upstream::UpstreamError),

    #[error("Read error: {0}")]
    Read(#[from] api::ReadError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tubewatch operations
pub type Result<T> = std::result::Result<T, TubeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetcher::{FetchCoordinator, FetchHandle};
pub use storage::{SharedStore, SqliteStorage, Video, VideoRecord};
pub use upstream::{VideoSource, YouTubeClient};
