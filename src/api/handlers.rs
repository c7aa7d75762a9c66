//! HTTP handlers for the read endpoint

use crate::api::error::ApiResult;
use crate::api::reader::{PaginationReader, VideoPage};
use crate::storage::SqliteStorage;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<PaginationReader<SqliteStorage>>,
    /// Cancelled on shutdown; each request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(reader: PaginationReader<SqliteStorage>, shutdown: CancellationToken) -> Self {
        Self {
            reader: Arc::new(reader),
            shutdown,
        }
    }
}

/// Query parameters for `GET /api/v1/videos`
///
/// `limit` is taken as text so that unparsable values fall back to the
/// default instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

/// Parses a raw `limit`; digit strings too large for `i64` saturate so they
/// are capped rather than replaced by the default
fn parse_limit(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => Some(i64::MAX),
        Err(_) => None,
    }
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListVideosParams>,
) -> ApiResult<Json<VideoPage>> {
    let limit = params.limit.as_deref().and_then(parse_limit);

    let cancel = state.shutdown.child_token();
    let page = state
        .reader
        .list(params.cursor.as_deref(), limit, &cancel)
        .await?;

    tracing::debug!(
        count = page.videos.len(),
        has_more = page.has_more,
        "Served video page"
    );

    Ok(Json(page))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
