use crate::collectors::snapshot;
use crate::exporter::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, error};

/// Runs a full scrape per request. The scrape holds the connection mutex in
/// a blocking task so concurrent requests queue rather than interleave on
/// the single connection.
pub async fn metrics(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static(snapshot::CONTENT_TYPE),
    );

    match tokio::task::spawn_blocking(move || state.render_metrics()).await {
        Ok(body) => {
            debug!("scrape rendered");
            (StatusCode::OK, headers, body)
        }
        Err(e) => {
            error!(error = %e, "scrape task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, headers, String::new())
        }
    }
}
