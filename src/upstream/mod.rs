//! Upstream video-search client
//!
//! This module wraps the external search API, including:
//! - Building the HTTP client and issuing search requests
//! - Translating search results into [`Video`]s
//! - Classifying quota exhaustion from the structured error body
//! - Rotating through API keys with a bounded retry

mod client;
mod types;

pub use client::{build_http_client, YouTubeClient};

use crate::storage::Video;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors reported by the upstream client
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("No API keys provided")]
    NoApiKeys,

    #[error("Quota exceeded for API key {key_index}")]
    QuotaExceeded { key_index: usize },

    #[error("All API keys exhausted after {attempts} attempts")]
    KeysExhausted { attempts: usize },

    #[error("API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to parse published date '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Upstream request cancelled")]
    Cancelled,
}

impl UpstreamError {
    /// Returns true if the error means the active key's allowance is used up
    pub fn is_quota_exhaustion(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// A source of newly published videos for a query
#[async_trait]
pub trait VideoSource: Send {
    /// Fetches videos matching `query` published at or after `since`
    async fn fetch_since(
        &mut self,
        query: &str,
        since: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Video>, UpstreamError>;
}
