use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};

const INDEX_HTML: &str = "<html><head><title>Altibase Exporter</title></head><body>\n\
<h1>Altibase Exporter</h1>\n<p><a href=\"/metrics\">Metrics</a></p>\n</body></html>";

pub async fn root() -> impl IntoResponse {
    Html(INDEX_HTML)
}

pub async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
