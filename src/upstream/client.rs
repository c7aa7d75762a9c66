//! Search API client with API key rotation
//!
//! # Request Flow
//!
//! 1. `GET {base}/search?part=snippet&q=..&type=video&order=date&maxResults=..&publishedAfter=..&key=..`
//! 2. On success, decode items and convert each video hit
//! 3. On failure, classify the structured error body
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Quota exhausted | Rotate to the next key, retry the same request |
//! | Every key exhausted | Fail with `KeysExhausted` |
//! | Any other API error | Fail, no retry |
//! | Network / decode / timestamp error | Fail, no retry |
//!
//! A single call makes at most one attempt per configured key. The active key
//! persists across calls.

use super::types::{classify_error, SearchListResponse};
use super::{UpstreamError, VideoSource};
use crate::config::YouTubeConfig;
use crate::storage::Video;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builds an HTTP client for the search API
///
/// # Arguments
///
/// * `timeout` - Whole-request timeout
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .build()
}

/// Client for the video search API
pub struct YouTubeClient {
    http: Client,
    search_url: String,
    api_keys: Vec<String>,
    current_key: usize,
    max_results: u32,
}

impl YouTubeClient {
    /// Creates a client using the first configured key
    ///
    /// # Returns
    ///
    /// * `Ok(YouTubeClient)` - Client ready to search
    /// * `Err(UpstreamError::NoApiKeys)` - The key list is empty
    /// * `Err(UpstreamError::Http)` - The HTTP client could not be built
    pub fn new(config: &YouTubeConfig) -> Result<Self, UpstreamError> {
        if config.api_keys.is_empty() {
            return Err(UpstreamError::NoApiKeys);
        }

        let http = build_http_client(Duration::from_secs(config.request_timeout_secs))?;

        Ok(Self {
            http,
            search_url: format!("{}/search", config.api_base_url.trim_end_matches('/')),
            api_keys: config.api_keys.clone(),
            current_key: 0,
            max_results: config.max_results,
        })
    }

    /// Index of the key used for the next request
    pub fn active_key_index(&self) -> usize {
        self.current_key
    }

    /// Number of configured keys
    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    /// Advances to the next key, wrapping around, and returns its index
    fn rotate_key(&mut self) -> usize {
        self.current_key = (self.current_key + 1) % self.api_keys.len();
        tracing::info!(key_index = self.current_key, "Rotated to new API key");
        self.current_key
    }

    /// Issues one search request with the active key
    async fn search_once(
        &self,
        query: &str,
        since: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Video>, UpstreamError> {
        let key_index = self.current_key;
        let published_after = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.max_results.to_string();

        let request = self
            .http
            .get(&self.search_url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
                ("publishedAfter", published_after.as_str()),
                ("key", self.api_keys[key_index].as_str()),
            ])
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            body = response.bytes() => body?,
        };

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body, key_index));
        }

        let parsed: SearchListResponse = serde_json::from_slice(&body)?;

        let mut videos = Vec::with_capacity(parsed.items.len());
        for item in parsed.items {
            if let Some(video) = item.into_video()? {
                videos.push(video);
            }
        }

        Ok(videos)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn fetch_since(
        &mut self,
        query: &str,
        since: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Video>, UpstreamError> {
        tracing::info!(
            query,
            published_after = %since.to_rfc3339_opts(SecondsFormat::Secs, true),
            key_index = self.current_key,
            "Fetching latest videos"
        );

        let attempts = self.key_count();
        for attempt in 1..=attempts {
            match self.search_once(query, since, cancel).await {
                Ok(videos) => {
                    tracing::info!(count = videos.len(), "Successfully fetched videos");
                    return Ok(videos);
                }
                Err(e) if e.is_quota_exhaustion() => {
                    tracing::warn!(error = %e, attempt, "Quota exceeded, rotating API key");
                    self.rotate_key();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch videos");
                    return Err(e);
                }
            }
        }

        tracing::error!(attempts, "All API keys exhausted");
        Err(UpstreamError::KeysExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(base_url: &str, keys: &[&str]) -> YouTubeConfig {
        YouTubeConfig {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            search_query: "cricket".to_string(),
            max_results: 25,
            api_base_url: base_url.to_string(),
            request_timeout_secs: 5,
        }
    }

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn search_body(ids: &[(&str, &str)]) -> serde_json::Value {
        let items: Vec<_> = ids
            .iter()
            .map(|(id, published)| {
                json!({
                    "id": { "kind": "youtube#video", "videoId": id },
                    "snippet": {
                        "publishedAt": published,
                        "channelId": "UC1",
                        "title": format!("Video {}", id),
                        "description": "",
                        "thumbnails": { "default": { "url": format!("https://img/{}.jpg", id) } },
                        "channelTitle": "Channel"
                    }
                })
            })
            .collect();
        json!({ "kind": "youtube#searchListResponse", "items": items })
    }

    fn quota_body() -> serde_json::Value {
        json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
            }
        })
    }

    #[test]
    fn test_empty_keys_rejected() {
        let config = create_test_config("http://localhost", &[]);
        assert!(matches!(
            YouTubeClient::new(&config),
            Err(UpstreamError::NoApiKeys)
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_search_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("part", "snippet"))
            .and(query_param("q", "cricket"))
            .and(query_param("type", "video"))
            .and(query_param("order", "date"))
            .and(query_param("maxResults", "25"))
            .and(query_param("publishedAfter", "2024-06-01T00:00:00Z"))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
                ("b", "2024-06-01T02:00:00Z"),
                ("a", "2024-06-01T01:00:00Z"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = YouTubeClient::new(&create_test_config(&server.uri(), &["k1"])).unwrap();
        let videos = client
            .fetch_since("cricket", since(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "b");
        assert_eq!(videos[1].thumbnail_url, "https://img/a.jpg");
    }

    #[tokio::test]
    async fn test_quota_rotates_and_key_persists() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("key", "k2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(search_body(&[("a", "2024-06-01T01:00:00Z")])),
            )
            .expect(2)
            .mount(&server)
            .await;

        let mut client =
            YouTubeClient::new(&create_test_config(&server.uri(), &["k1", "k2"])).unwrap();
        let cancel = CancellationToken::new();

        let first = client.fetch_since("cricket", since(), &cancel).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(client.active_key_index(), 1);

        // The next call starts on the rotated key; k1 is not tried again.
        client.fetch_since("cricket", since(), &cancel).await.unwrap();
        assert_eq!(client.active_key_index(), 1);
    }

    #[tokio::test]
    async fn test_all_keys_exhausted_is_bounded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
            .expect(3)
            .mount(&server)
            .await;

        let mut client =
            YouTubeClient::new(&create_test_config(&server.uri(), &["k1", "k2", "k3"])).unwrap();

        let result = client
            .fetch_since("cricket", since(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(UpstreamError::KeysExhausted { attempts: 3 })
        ));
        assert_eq!(client.active_key_index(), 0);
    }

    #[tokio::test]
    async fn test_non_quota_error_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Invalid value for publishedAfter",
                    "errors": [{ "reason": "invalidPublishedAfter" }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client =
            YouTubeClient::new(&create_test_config(&server.uri(), &["k1", "k2"])).unwrap();

        let result = client
            .fetch_since("cricket", since(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(UpstreamError::Api { status: 400, .. })));
        assert_eq!(client.active_key_index(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
            .mount(&server)
            .await;

        let mut client = YouTubeClient::new(&create_test_config(&server.uri(), &["k1"])).unwrap();
        let result = client
            .fetch_since("cricket", since(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(UpstreamError::Decode(_))));
    }

    #[tokio::test]
    async fn test_cancellation_returns_promptly() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(search_body(&[]))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let mut client = YouTubeClient::new(&create_test_config(&server.uri(), &["k1"])).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = client.fetch_since("cricket", since(), &cancel).await;

        assert!(matches!(result, Err(UpstreamError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
