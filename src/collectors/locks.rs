//! Lock counts plus the worst lock-hold and lock-wait as single labelled
//! series. The detail series always exist: a zero-valued placeholder row is
//! emitted when nothing is held or waiting, keeping label cardinality stable
//! for alerting.

use crate::collectors::context::labels;
use crate::collectors::{seconds_label, ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const LOCK_COUNTS_SQL: &str =
    "SELECT DECODE(LOCK_STMT.STATE, 0, 'LOCK_HOLD_COUNT', 1, 'LOCK_WAIT_COUNT') AS LOCK_STATE, COUNT(*) AS CNT \
     FROM SYSTEM_.SYS_TABLES_ TBL, V$LOCK_STATEMENT LOCK_STMT, V$STATEMENT STMT \
     LEFT OUTER JOIN V$LOCK_WAIT LOCK_WAIT ON STMT.TX_ID = LOCK_WAIT.TRANS_ID \
     WHERE TBL.TABLE_OID = LOCK_STMT.TABLE_OID AND STMT.SESSION_ID = LOCK_STMT.SESSION_ID \
     AND STMT.TX_ID = LOCK_STMT.TX_ID AND LOCK_STMT.STATE IN (0,1) GROUP BY LOCK_STMT.STATE";

pub const LOCK_HOLD_DETAIL_SQL: &str =
    "SELECT STMT.SESSION_ID, STMT.TX_ID, L.IS_GRANT, L.LOCK_DESC, TBL.TABLE_NAME, STMT.TOTAL_TIME, SUBSTR(STMT.QUERY, 1, 50) \
     FROM SYSTEM_.SYS_TABLES_ TBL, V$STATEMENT STMT, V$LOCK L, V$LOCK_WAIT LOCK_WAIT \
     WHERE L.TRANS_ID = LOCK_WAIT.WAIT_FOR_TRANS_ID AND L.TABLE_OID = TBL.TABLE_OID AND L.TRANS_ID = STMT.TX_ID \
     ORDER BY STMT.TOTAL_TIME DESC LIMIT 1";

pub const LOCK_WAIT_DETAIL_SQL: &str =
    "SELECT STMT.SESSION_ID, STMT.TX_ID, L.IS_GRANT, NVL(LOCK_WAIT.WAIT_FOR_TRANS_ID, -1), L.LOCK_DESC, TBL.TABLE_NAME, STMT.TOTAL_TIME, SUBSTR(STMT.QUERY, 1, 50) \
     FROM SYSTEM_.SYS_TABLES_ TBL, V$STATEMENT STMT, V$LOCK L, V$LOCK_WAIT LOCK_WAIT \
     WHERE L.TRANS_ID = LOCK_WAIT.TRANS_ID AND L.TABLE_OID = TBL.TABLE_OID AND L.TRANS_ID = STMT.TX_ID \
     ORDER BY STMT.TOTAL_TIME DESC LIMIT 1";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new(
        "lock_counts",
        &["lock_hold_count", "lock_wait_count"],
        scrape_lock_counts,
    ),
    ScrapeTask::new("lock_hold_detail", &["lock_hold_detail"], scrape_lock_hold_detail),
    ScrapeTask::new("lock_wait_detail", &["lock_wait_detail"], scrape_lock_wait_detail),
];

fn scrape_lock_counts(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(LOCK_COUNTS_SQL)?;
    let mut hold = 0.0;
    let mut wait = 0.0;
    for row in 0..rs.rows.len() {
        let state = rs.value(row, 0).as_text();
        let count = rs.value(row, 1).as_f64();
        match state.as_str() {
            "LOCK_HOLD_COUNT" => hold = count,
            "LOCK_WAIT_COUNT" => wait = count,
            _ => {}
        }
    }
    if !ctx.is_disabled("lock_hold_count") {
        ctx.add("lock_hold_count", hold);
    }
    if !ctx.is_disabled("lock_wait_count") {
        ctx.add("lock_wait_count", wait);
    }
    Ok(())
}

fn scrape_lock_hold_detail(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(LOCK_HOLD_DETAIL_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "lock_hold_detail",
            labels(&[
                ("session_id", "0"),
                ("tx_id", "0"),
                ("table_name", ""),
                ("total_time_seconds", "0"),
                ("query", ""),
                ("is_grant", "0"),
                ("lock_desc", ""),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let tx_id = rs.value(0, 1).as_text();
    let is_grant = rs.value(0, 2).as_text();
    let lock_desc = rs.value(0, 3).as_text();
    let table_name = rs.value(0, 4).as_text();
    let total_time = seconds_label(rs.value(0, 5).as_f64());
    let query = rs.value(0, 6).as_text();
    ctx.add_labeled(
        "lock_hold_detail",
        labels(&[
            ("session_id", &session_id),
            ("tx_id", &tx_id),
            ("table_name", &table_name),
            ("total_time_seconds", &total_time),
            ("query", &query),
            ("is_grant", &is_grant),
            ("lock_desc", &lock_desc),
        ]),
        1.0,
    );
    Ok(())
}

fn scrape_lock_wait_detail(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(LOCK_WAIT_DETAIL_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "lock_wait_detail",
            labels(&[
                ("session_id", "0"),
                ("tx_id", "0"),
                ("wait_for_tx_id", "0"),
                ("table_name", ""),
                ("total_time_seconds", "0"),
                ("query", ""),
                ("is_grant", "0"),
                ("lock_desc", ""),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let tx_id = rs.value(0, 1).as_text();
    let is_grant = rs.value(0, 2).as_text();
    let wait_for_tx_id = rs.value(0, 3).as_text();
    let lock_desc = rs.value(0, 4).as_text();
    let table_name = rs.value(0, 5).as_text();
    let total_time = seconds_label(rs.value(0, 6).as_f64());
    let query = rs.value(0, 7).as_text();
    ctx.add_labeled(
        "lock_wait_detail",
        labels(&[
            ("session_id", &session_id),
            ("tx_id", &tx_id),
            ("wait_for_tx_id", &wait_for_tx_id),
            ("table_name", &table_name),
            ("total_time_seconds", &total_time),
            ("query", &query),
            ("is_grant", &is_grant),
            ("lock_desc", &lock_desc),
        ]),
        1.0,
    );
    Ok(())
}
