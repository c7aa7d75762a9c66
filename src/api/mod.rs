//! HTTP read API
//!
//! This module serves stored videos back to consumers:
//! - `GET /api/v1/videos` with `cursor` and `limit` query parameters
//! - `GET /health`
//!
//! Pagination is newest first, keyed by an opaque publish-time cursor.

mod cursor;
mod error;
mod handlers;
mod reader;

pub use cursor::{Cursor, CursorError};
pub use error::{ApiError, ApiResult};
pub use handlers::{AppState, ListVideosParams};
pub use reader::{PaginationReader, ReadError, VideoPage};

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the API router
///
/// # Arguments
///
/// * `state` - Shared handler state
/// * `allowed_origins` - Origins permitted by CORS; unparsable entries are skipped
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/api/v1/videos", get(handlers::list_videos))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `app` until `signal` resolves, then drains in-flight requests
///
/// `shutdown` is cancelled as soon as `signal` fires, so reads still running
/// while the server drains stop at their next store call.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            shutdown.cancel();
        })
        .await
}
