#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use altibase_exporter::collectors::config::DisableSet;
use altibase_exporter::collectors::engine::ScrapeEngine;
use altibase_exporter::custom::{CustomQueryEngine, QueryDef};
use altibase_exporter::db::mock::MockConnection;
use altibase_exporter::exporter::{AppState, app};

/// Spin up the real HTTP app on an ephemeral port against a scripted
/// connection; returns the base URL.
pub async fn spawn_app(conn: MockConnection, disabled: &str, custom: Vec<QueryDef>) -> String {
    let engine = ScrapeEngine::new(DisableSet::parse(disabled)).unwrap();
    let state = AppState::new(Box::new(conn), engine, CustomQueryEngine::new(custom));
    let router = app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });

    format!("http://{addr}")
}

pub fn query_def(name: &str, help: &str, sql: &str) -> QueryDef {
    QueryDef {
        name: name.to_string(),
        help: help.to_string(),
        sql: sql.to_string(),
        label_columns: None,
    }
}
