//! Search API wire types
//!
//! Only the fields the fetcher uses are decoded; everything else is ignored.

use super::UpstreamError;
use crate::storage::Video;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Error reasons that mean the key's allowance is depleted
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

const VIDEO_KIND: &str = "youtube#video";

#[derive(Debug, Deserialize)]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    pub id: ResourceId,
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceId {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Snippet {
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "channelId", default)]
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Picks the smallest available thumbnail
    fn preferred_url(&self) -> String {
        [&self.default, &self.medium, &self.high]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .next()
            .unwrap_or_default()
    }
}

impl SearchResult {
    /// Converts a search hit into a [`Video`]
    ///
    /// Returns `Ok(None)` for hits that are not videos (channels, playlists).
    pub fn into_video(self) -> Result<Option<Video>, UpstreamError> {
        let id = match self.id.video_id {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };
        if let Some(kind) = &self.id.kind {
            if kind != VIDEO_KIND {
                return Ok(None);
            }
        }

        let published_at = DateTime::parse_from_rfc3339(&self.snippet.published_at)
            .map_err(|source| UpstreamError::InvalidTimestamp {
                value: self.snippet.published_at.clone(),
                source,
            })?
            .with_timezone(&Utc);

        Ok(Some(Video {
            id,
            thumbnail_url: self.snippet.thumbnails.preferred_url(),
            title: self.snippet.title,
            description: self.snippet.description,
            published_at,
            channel_title: self.snippet.channel_title,
            channel_id: self.snippet.channel_id,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}

/// Classifies a non-success response
///
/// Quota exhaustion is recognised by the structured `reason` field, not by the
/// status code or message text.
pub(crate) fn classify_error(status: u16, body: &[u8], key_index: usize) -> UpstreamError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .first()
                .map(|d| d.reason.clone())
                .unwrap_or_default();

            if QUOTA_REASONS.contains(&reason.as_str()) {
                UpstreamError::QuotaExceeded { key_index }
            } else {
                UpstreamError::Api {
                    status,
                    reason,
                    message: envelope.error.message,
                }
            }
        }
        Err(_) => UpstreamError::Api {
            status,
            reason: String::new(),
            message: String::from_utf8_lossy(body).chars().take(200).collect(),
        },
    }
}
