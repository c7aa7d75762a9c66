//! Configuration module for Tubewatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! API keys and the search query may be supplied through the environment instead
//! of the file (`YOUTUBE_API_KEYS`, `SEARCH_QUERY`).
//!
//! # Example
//!
//! ```no_run
//! use tubewatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Polling for: {}", config.youtube.search_query);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, ServerConfig, StorageConfig, YouTubeConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
