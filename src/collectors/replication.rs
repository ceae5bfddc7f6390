//! Replication health: sender/receiver counts, per-replication gap, and the
//! peer endpoint series.
//!
//! The peer query has two column shapes: newer servers expose
//! PEER_IP/PEER_PORT plus MODE, older ones REMOTE_IP/REMOTE_REP_PORT without
//! a mode column. The fallback shape reports `mode="unknown"`.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const SENDER_COUNT_SQL: &str = "SELECT COUNT(*) FROM V$REPSENDER";
pub const RECEIVER_COUNT_SQL: &str = "SELECT COUNT(*) FROM V$REPRECEIVER";
pub const REPLICATION_GAP_SQL: &str =
    "SELECT REP_NAME || '_GAP' AS REP_NAME, REP_GAP FROM V$REPGAP";
pub const REPLICATION_PEER_SQL: &str =
    "SELECT REP_NAME, PEER_IP, PEER_PORT, STATUS, MODE FROM V$REPSENDER";
pub const REPLICATION_PEER_FALLBACK_SQL: &str =
    "SELECT REP_NAME, REMOTE_IP, REMOTE_REP_PORT, STATUS FROM V$REPSENDER";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("replication_gap", &["replication_gap"], scrape_replication_gap),
    ScrapeTask::tolerant("replication_peer", &["replication_peer"], scrape_replication_peer),
    ScrapeTask::new(
        "replication_receiver_count",
        &["replication_receiver_count"],
        scrape_receiver_count,
    ),
    ScrapeTask::new(
        "replication_sender_count",
        &["replication_sender_count"],
        scrape_sender_count,
    ),
];

fn scrape_sender_count(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let count = ctx.query_scalar(SENDER_COUNT_SQL)?;
    ctx.add("replication_sender_count", count);
    Ok(())
}

fn scrape_receiver_count(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let count = ctx.query_scalar(RECEIVER_COUNT_SQL)?;
    ctx.add("replication_receiver_count", count);
    Ok(())
}

fn scrape_replication_gap(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(REPLICATION_GAP_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let gap = rs.value(row, 1).as_f64();
        ctx.add_labeled("replication_gap", labels(&[("replication", &name)]), gap);
    }
    Ok(())
}

fn sender_status(status: f64) -> &'static str {
    if status == 1.0 {
        "active"
    } else if status == 0.0 {
        "stopped"
    } else {
        "unknown"
    }
}

fn scrape_replication_peer(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query_with_fallback(REPLICATION_PEER_SQL, REPLICATION_PEER_FALLBACK_SQL)?;

    let ip_col = rs.col("PEER_IP").or_else(|| rs.col("REMOTE_IP"));
    let port_col = rs.col("PEER_PORT").or_else(|| rs.col("REMOTE_REP_PORT"));
    let mode_col = rs.col("MODE");

    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let ip = ip_col.map(|c| rs.value(row, c).as_text()).unwrap_or_default();
        let port = port_col.map(|c| rs.value(row, c).as_text()).unwrap_or_default();
        let status = rs
            .col("STATUS")
            .map_or(f64::MIN, |c| rs.value(row, c).as_f64());
        let mode = match mode_col {
            Some(c) if !rs.value(row, c).is_null() => {
                let mode = rs.value(row, c).as_text();
                if mode.trim().is_empty() {
                    "unknown".to_string()
                } else {
                    mode
                }
            }
            _ => "unknown".to_string(),
        };
        let peer = format!("{ip}:{port}");
        ctx.add_labeled(
            "replication_peer",
            labels(&[
                ("replication", &name),
                ("role", "sender"),
                ("instance_role", "master"),
                ("status", sender_status(status)),
                ("mode", &mode),
                ("peer", &peer),
            ]),
            1.0,
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collectors::config::DisableSet;
    use crate::db::mock::MockConnection;
    use crate::db::{Connection, Value};

    #[test]
    fn gap_rows_become_labelled_points() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            REPLICATION_GAP_SQL,
            &["REP_NAME", "REP_GAP"],
            vec![vec![Value::Text("REP1_GAP".into()), Value::Number(120.0)]],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_replication_gap(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].1[0].labels, labels(&[("replication", "REP1_GAP")]));
        assert_eq!(points[0].1[0].value, 120.0);
    }

    #[test]
    fn peer_fallback_shape_maps_remote_columns() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new()
            .with_error(REPLICATION_PEER_SQL, "Column not found: PEER_IP")
            .with_result(
                REPLICATION_PEER_FALLBACK_SQL,
                &["REP_NAME", "REMOTE_IP", "REMOTE_REP_PORT", "STATUS"],
                vec![vec![
                    Value::Text("r1".into()),
                    Value::Text("10.0.0.1".into()),
                    Value::Number(5678.0),
                    Value::Number(1.0),
                ]],
            );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_replication_peer(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].0, "replication_peer");
        assert_eq!(
            points[0].1[0].labels,
            labels(&[
                ("replication", "r1"),
                ("role", "sender"),
                ("instance_role", "master"),
                ("status", "active"),
                ("mode", "unknown"),
                ("peer", "10.0.0.1:5678"),
            ])
        );
        assert_eq!(points[0].1[0].value, 1.0);
    }

    #[test]
    fn peer_preferred_shape_reports_mode() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            REPLICATION_PEER_SQL,
            &["REP_NAME", "PEER_IP", "PEER_PORT", "STATUS", "MODE"],
            vec![vec![
                Value::Text("r2".into()),
                Value::Text("10.0.0.9".into()),
                Value::Number(4000.0),
                Value::Number(0.0),
                Value::Text("LAZY".into()),
            ]],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_replication_peer(&mut ctx).unwrap();

        let points = ctx.into_points();
        let point = &points[0].1[0];
        assert!(point.labels.iter().any(|(n, v)| n == "mode" && v == "LAZY"));
        assert!(point.labels.iter().any(|(n, v)| n == "status" && v == "stopped"));
    }

    #[test]
    fn peer_emits_nothing_on_zero_rows() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            REPLICATION_PEER_SQL,
            &["REP_NAME", "PEER_IP", "PEER_PORT", "STATUS", "MODE"],
            vec![],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_replication_peer(&mut ctx).unwrap();
        assert!(ctx.into_points().is_empty());
    }
}
