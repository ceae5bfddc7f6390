use axum::http::StatusCode;

/// Liveness probe: the process is up. Database health is intentionally not
/// checked here; a broken connection shows up as
/// `altibase_exporter_last_scrape_success 0` instead of a dead probe.
pub async fn healthy() -> StatusCode {
    StatusCode::OK
}
