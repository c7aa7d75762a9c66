//! Integration tests for the fetch → store → paginate flow
//!
//! These tests use wiremock to stand in for the search API and an on-disk
//! SQLite database for storage.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tubewatch::api::PaginationReader;
use tubewatch::config::{FetcherConfig, ServerConfig, YouTubeConfig};
use tubewatch::storage::{SharedStore, SqliteStorage, VideoStore};
use tubewatch::{FetchCoordinator, YouTubeClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn youtube_config(base_url: &str, keys: &[&str]) -> YouTubeConfig {
    YouTubeConfig {
        api_keys: keys.iter().map(|k| k.to_string()).collect(),
        search_query: "cricket".to_string(),
        max_results: 25,
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
    }
}

fn fetcher_config() -> FetcherConfig {
    FetcherConfig {
        interval_secs: 1,
        fallback_window_secs: 3600,
    }
}

fn search_body(items: &[(&str, DateTime<Utc>)]) -> serde_json::Value {
    let items: Vec<_> = items
        .iter()
        .map(|(id, published)| {
            json!({
                "kind": "youtube#searchResult",
                "id": { "kind": "youtube#video", "videoId": id },
                "snippet": {
                    "publishedAt": published.to_rfc3339(),
                    "channelId": "UCchannel",
                    "title": format!("Video {}", id),
                    "description": "match highlights",
                    "thumbnails": {
                        "default": { "url": format!("https://i.ytimg.com/vi/{}/default.jpg", id) }
                    },
                    "channelTitle": "Cricket TV"
                }
            })
        })
        .collect();
    json!({ "kind": "youtube#searchListResponse", "items": items })
}

fn open_store(dir: &tempfile::TempDir) -> SharedStore<SqliteStorage> {
    let storage = SqliteStorage::new(&dir.path().join("videos.db")).expect("Failed to open DB");
    SharedStore::new(storage)
}

#[tokio::test]
async fn test_cycles_persist_and_advance_watermark() {
    let mock_server = MockServer::start().await;
    let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 6, 1, 9, 45, 0).unwrap();

    // First cycle: empty store, whatever the fallback watermark is
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_body(&[("late", t2), ("early", t1)])),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    // Second cycle must ask from the newest stored publish time plus one second
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("publishedAfter", "2024-06-01T09:45:01Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let client = YouTubeClient::new(&youtube_config(&mock_server.uri(), &["k1"])).unwrap();
    let mut coordinator = FetchCoordinator::new(
        client,
        store.clone(),
        &fetcher_config(),
        "cricket".to_string(),
    );
    let cancel = CancellationToken::new();

    let first = coordinator.run_cycle(&cancel).await.expect("first cycle failed");
    assert_eq!(first.fetched, 2);
    assert_eq!(first.stored, 2);

    let second = coordinator.run_cycle(&cancel).await.expect("second cycle failed");
    assert_eq!(second.watermark, t2 + Duration::seconds(1));
    assert_eq!(second.fetched, 0);

    // Data survives a reopen of the database file
    drop(coordinator);
    drop(store);
    let reopened = SqliteStorage::new(&dir.path().join("videos.db")).unwrap();
    assert_eq!(reopened.count_videos().unwrap(), 2);
    let stored = reopened.get_video("late").unwrap().expect("video missing");
    assert_eq!(stored.published_at, t2);
    assert_eq!(stored.channel_title, "Cricket TV");
    assert_eq!(
        stored.thumbnail_url,
        "https://i.ytimg.com/vi/late/default.jpg"
    );
}

#[tokio::test]
async fn test_quota_rotation_then_paginated_read() {
    let mock_server = MockServer::start().await;
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(query_param("key", "k1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("key", "k2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
            ("t", t),
            ("t-1", t - Duration::seconds(1)),
            ("t-2", t - Duration::seconds(2)),
            ("t-3", t - Duration::seconds(3)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let client = YouTubeClient::new(&youtube_config(&mock_server.uri(), &["k1", "k2"])).unwrap();
    let mut coordinator = FetchCoordinator::new(
        client,
        store.clone(),
        &fetcher_config(),
        "cricket".to_string(),
    );
    let cancel = CancellationToken::new();

    let report = coordinator.run_cycle(&cancel).await.expect("cycle failed");
    assert_eq!(report.stored, 4);
    assert_eq!(coordinator.source().active_key_index(), 1);

    let reader = PaginationReader::new(store, &ServerConfig::default());

    let page1 = reader.list(None, Some(2), &cancel).await.unwrap();
    let ids: Vec<_> = page1.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["t", "t-1"]);
    assert!(page1.has_more);
    assert_eq!(page1.next_cursor.as_deref(), Some("2024-06-01T11:59:59Z"));

    let page2 = reader
        .list(page1.next_cursor.as_deref(), Some(2), &cancel)
        .await
        .unwrap();
    let ids: Vec<_> = page2.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["t-2", "t-3"]);
    assert!(!page2.has_more);
    assert_eq!(page2.total, 4);
}

#[tokio::test]
async fn test_failed_cycle_leaves_store_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": { "kind": "youtube#video", "videoId": "bad" },
                "snippet": { "publishedAt": "not a timestamp" }
            }]
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let client = YouTubeClient::new(&youtube_config(&mock_server.uri(), &["k1"])).unwrap();
    let mut coordinator = FetchCoordinator::new(
        client,
        store.clone(),
        &fetcher_config(),
        "cricket".to_string(),
    );
    let cancel = CancellationToken::new();

    assert!(coordinator.run_cycle(&cancel).await.is_err());
    assert_eq!(store.count_videos(&cancel).await.unwrap(), 0);
}
