#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use altibase_exporter::collectors::{instance, sessions, sysstat};
use altibase_exporter::db::Value;
use altibase_exporter::db::mock::MockConnection;
use anyhow::Result;

mod common;

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() -> Result<()> {
    let url = common::spawn_app(MockConnection::new(), "", vec![]).await;

    let response = reqwest::get(format!("{url}/metrics")).await?;

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .expect("Content-Type header should be present");
    assert_eq!(content_type, "text/plain; version=0.0.4");

    let body = response.text().await?;
    assert!(body.contains("# HELP"));
    assert!(body.contains("# TYPE"));
    assert!(body.contains("altibase_exporter_last_scrape_success 1\n"));
    assert!(body.contains("altibase_scrape_duration_seconds"));

    Ok(())
}

#[tokio::test]
async fn working_time_row_is_exposed_once() -> Result<()> {
    let conn = MockConnection::new().with_result(
        instance::WORKING_TIME_SQL,
        &["WORKING_TIME_SEC"],
        vec![vec![Value::Number(42.0)]],
    );
    let url = common::spawn_app(conn, "", vec![]).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    let occurrences = body
        .lines()
        .filter(|l| *l == "altibase_instance_working_time_seconds 42")
        .count();
    assert_eq!(occurrences, 1);
    assert!(body.contains("altibase_exporter_last_scrape_success 1\n"));

    Ok(())
}

#[tokio::test]
async fn sessions_are_labelled_by_status() -> Result<()> {
    let conn = MockConnection::new()
        .with_result(
            sessions::TOTAL_SESSIONS_SQL,
            &["COUNT"],
            vec![vec![Value::Number(7.0)]],
        )
        .with_result(
            sessions::ACTIVE_SESSIONS_SQL,
            &["COUNT"],
            vec![vec![Value::Number(3.0)]],
        );
    let url = common::spawn_app(conn, "", vec![]).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    assert!(body.contains(r#"altibase_sessions{status="total"} 7"#));
    assert!(body.contains(r#"altibase_sessions{status="active"} 3"#));

    Ok(())
}

#[tokio::test]
async fn disabled_metrics_do_not_appear() -> Result<()> {
    let conn = MockConnection::new().with_result(
        sysstat::SYSSTAT_SQL,
        &["NAME", "VALUE"],
        vec![vec![Value::Text("x".into()), Value::Number(1.0)]],
    );
    let url = common::spawn_app(conn, "sysstat,replication_gap", vec![]).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    assert!(!body.contains("altibase_sysstat"));
    assert!(!body.contains("altibase_replication_gap"));
    // Everything else still collects.
    assert!(body.contains("altibase_sessions"));
    assert!(body.contains("altibase_exporter_last_scrape_success 1\n"));

    Ok(())
}

#[tokio::test]
async fn custom_query_rows_become_gauge_samples() -> Result<()> {
    let sql = "SELECT 'a' AS region, 5 AS value";
    let conn = MockConnection::new().with_result(
        sql,
        &["REGION", "VALUE"],
        vec![vec![Value::Text("a".into()), Value::Number(5.0)]],
    );
    let custom = vec![common::query_def("q1", "h", sql)];
    let url = common::spawn_app(conn, "", custom).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    assert!(body.contains(r#"altibase_custom_q1{region="a"} 5"#));

    Ok(())
}

#[tokio::test]
async fn info_series_come_last() -> Result<()> {
    let sql = "SELECT 'a' AS region, 5 AS value";
    let conn = MockConnection::new().with_result(
        sql,
        &["REGION", "VALUE"],
        vec![vec![Value::Text("a".into()), Value::Number(5.0)]],
    );
    let custom = vec![common::query_def("q1", "h", sql)];
    let url = common::spawn_app(conn, "", custom).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    let build = body.find("altibase_exporter_build{").unwrap();
    let version = body.find("altibase_version{").unwrap();
    let custom_pos = body.find("altibase_custom_q1{").unwrap();
    let success = body.find("altibase_exporter_last_scrape_success").unwrap();

    assert!(success < custom_pos);
    assert!(custom_pos < build);
    assert!(build < version);

    Ok(())
}

#[tokio::test]
async fn every_sample_name_is_namespaced() -> Result<()> {
    let url = common::spawn_app(MockConnection::new(), "", vec![]).await;

    let body = reqwest::get(format!("{url}/metrics")).await?.text().await?;

    for line in body.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        assert!(
            line.starts_with("altibase_"),
            "sample not namespaced: {line}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn dead_connection_still_serves_self_metrics() -> Result<()> {
    let conn = MockConnection::new().refusing_executors();
    let url = common::spawn_app(conn, "", vec![]).await;

    let response = reqwest::get(format!("{url}/metrics")).await?;
    assert_eq!(response.status(), 200);

    let body = response.text().await?;
    assert!(body.contains("altibase_exporter_last_scrape_success 0\n"));
    assert!(body.contains("altibase_scrape_duration_seconds"));
    assert!(body.contains(r#"altibase_version{version="unknown"} 1"#));

    Ok(())
}

#[tokio::test]
async fn consecutive_scrapes_succeed() -> Result<()> {
    let url = common::spawn_app(MockConnection::new(), "", vec![]).await;

    for _ in 0..3 {
        let response = reqwest::get(format!("{url}/metrics")).await?;
        assert_eq!(response.status(), 200);
        let body = response.text().await?;
        assert!(body.contains("altibase_exporter_last_scrape_success 1\n"));
    }

    Ok(())
}
