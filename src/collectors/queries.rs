//! Problem-query reporting: long-running, uncommitted-transaction and
//! full-scan statements, as counts plus worst-offender detail series, and
//! the transaction pinning the memory view SCN.
//!
//! Detail series emit a zero-valued placeholder when no row qualifies so the
//! series is always present. Full-scan reporting excludes the exporter's own
//! sessions via the CLIENT_INFO identity registered at startup.

use crate::collectors::context::labels;
use crate::collectors::{seconds_label, ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const LONG_RUN_COUNT_SQL: &str =
    "SELECT COUNT(*) FROM V$STATEMENT WHERE EXECUTE_FLAG = 1 AND EXECUTE_TIME/1000000 > 1";

pub const LONG_RUN_DETAIL_SQL: &str =
    "SELECT SESSION_ID, ID, TX_ID, (PARSE_TIME+VALIDATE_TIME+OPTIMIZE_TIME) AS PREPARE_TIME, FETCH_TIME, EXECUTE_TIME, TOTAL_TIME, NVL(LTRIM(QUERY), 'NONE') \
     FROM V$STATEMENT WHERE EXECUTE_FLAG = 1 AND EXECUTE_TIME/1000000 > 1 ORDER BY EXECUTE_TIME DESC LIMIT 1";

pub const UTRANS_COUNT_SQL: &str =
    "SELECT COUNT(*) FROM V$TRANSACTION TR, V$STATEMENT ST, V$SESSIONMGR, V$SESSION SS \
     WHERE TR.ID = ST.TX_ID AND ST.SESSION_ID = SS.ID AND TR.FIRST_UPDATE_TIME != 0 AND (BASE_TIME - TR.FIRST_UPDATE_TIME) > 1";

pub const UTRANS_DETAIL_SQL: &str =
    "SELECT ST.SESSION_ID, SS.COMM_NAME, SS.CLIENT_PID, SS.CLIENT_APP_INFO, (BASE_TIME - TR.FIRST_UPDATE_TIME) AS UTRANS_TIME, ST.EXECUTE_TIME, ST.TOTAL_TIME, NVL(LTRIM(ST.QUERY), 'NONE') \
     FROM V$TRANSACTION TR, V$STATEMENT ST, V$SESSIONMGR, V$SESSION SS \
     WHERE TR.ID = ST.TX_ID AND ST.SESSION_ID = SS.ID AND TR.FIRST_UPDATE_TIME != 0 AND (BASE_TIME - TR.FIRST_UPDATE_TIME) > 1 \
     ORDER BY (BASE_TIME - TR.FIRST_UPDATE_TIME) DESC LIMIT 1";

pub const FULLSCAN_COUNT_SQL: &str =
    "SELECT COUNT(*) FROM V$STATEMENT T, V$SESSION S WHERE S.ID = T.SESSION_ID \
     AND (MEM_CURSOR_FULL_SCAN > 0 OR DISK_CURSOR_FULL_SCAN > 0) AND UPPER(QUERY) NOT LIKE '%INSERT%' \
     AND S.CLIENT_INFO != 'altibase-exporter'";

pub const FULLSCAN_DETAIL_SQL: &str =
    "SELECT T.SESSION_ID, S.COMM_NAME, S.CLIENT_PID, S.CLIENT_APP_INFO, (T.PARSE_TIME+T.VALIDATE_TIME+T.OPTIMIZE_TIME) AS PREPARE_TIME, T.FETCH_TIME, T.EXECUTE_TIME, T.TOTAL_TIME, NVL(LTRIM(T.QUERY), 'NONE') \
     FROM V$STATEMENT T, V$SESSION S WHERE S.ID = T.SESSION_ID AND (T.MEM_CURSOR_FULL_SCAN > 0 OR T.DISK_CURSOR_FULL_SCAN > 0) \
     AND UPPER(T.QUERY) NOT LIKE '%INSERT%' AND S.CLIENT_INFO != 'altibase-exporter' ORDER BY T.EXECUTE_TIME DESC LIMIT 1";

pub const TX_VIEW_SCN_SQL: &str =
    "SELECT ST.SESSION_ID, TX.ID AS TX_ID, ST.TOTAL_TIME, ST.EXECUTE_TIME, SUBSTR(ST.QUERY, 1, 50) FROM V$STATEMENT ST, V$TRANSACTION TX \
     WHERE ST.TX_ID = TX.ID AND TX.ID IN (SELECT T.ID FROM V$TRANSACTION T, (SELECT MINMEMSCNINTXS AS SCN_VAL FROM V$MEMGC LIMIT 1) GC \
     WHERE T.MEMORY_VIEW_SCN = GC.SCN_VAL OR T.MIN_MEMORY_LOB_VIEW_SCN = GC.SCN_VAL) AND ST.SESSION_ID != SESSION_ID() AND TX.SESSION_ID <> SESSION_ID() \
     ORDER BY ST.TOTAL_TIME DESC LIMIT 1";

/// Older servers do not expose the SCN columns; the fallback drops the SCN
/// correlation and reports the heaviest open statement instead.
pub const TX_VIEW_SCN_FALLBACK_SQL: &str =
    "SELECT ST.SESSION_ID, TX.ID AS TX_ID, ST.TOTAL_TIME, ST.EXECUTE_TIME, SUBSTR(ST.QUERY, 1, 50) FROM V$STATEMENT ST, V$TRANSACTION TX \
     WHERE ST.TX_ID = TX.ID AND ST.SESSION_ID != SESSION_ID() AND TX.SESSION_ID <> SESSION_ID() ORDER BY ST.TOTAL_TIME DESC LIMIT 1";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("fullscan_query_count", &["fullscan_query_count"], scrape_fullscan_count),
    ScrapeTask::tolerant(
        "fullscan_query_detail",
        &["fullscan_query_detail"],
        scrape_fullscan_detail,
    ),
    ScrapeTask::new("long_run_query_count", &["long_run_query_count"], scrape_long_run_count),
    ScrapeTask::new(
        "long_run_query_detail",
        &["long_run_query_detail"],
        scrape_long_run_detail,
    ),
    ScrapeTask::tolerant(
        "tx_of_memory_view_scn",
        &["tx_of_memory_view_scn"],
        scrape_tx_view_scn,
    ),
    ScrapeTask::new("utrans_query_count", &["utrans_query_count"], scrape_utrans_count),
    ScrapeTask::new("utrans_query_detail", &["utrans_query_detail"], scrape_utrans_detail),
];

fn scrape_long_run_count(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let count = ctx.query_scalar(LONG_RUN_COUNT_SQL)?;
    ctx.add("long_run_query_count", count);
    Ok(())
}

fn scrape_utrans_count(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let count = ctx.query_scalar(UTRANS_COUNT_SQL)?;
    ctx.add("utrans_query_count", count);
    Ok(())
}

fn scrape_fullscan_count(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let count = ctx.query_scalar(FULLSCAN_COUNT_SQL)?;
    ctx.add("fullscan_query_count", count);
    Ok(())
}

fn scrape_long_run_detail(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(LONG_RUN_DETAIL_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "long_run_query_detail",
            labels(&[
                ("session_id", "0"),
                ("stmt_id", "0"),
                ("tx_id", "0"),
                ("prepare_time_seconds", "0"),
                ("fetch_time_seconds", "0"),
                ("execute_time_seconds", "0"),
                ("total_time_seconds", "0"),
                ("query", "none"),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let stmt_id = rs.value(0, 1).as_text();
    let tx_id = rs.value(0, 2).as_text();
    let prepare = seconds_label(rs.value(0, 3).as_f64());
    let fetch = seconds_label(rs.value(0, 4).as_f64());
    let execute = seconds_label(rs.value(0, 5).as_f64());
    let total = seconds_label(rs.value(0, 6).as_f64());
    let query = rs.value(0, 7).as_text();
    ctx.add_labeled(
        "long_run_query_detail",
        labels(&[
            ("session_id", &session_id),
            ("stmt_id", &stmt_id),
            ("tx_id", &tx_id),
            ("prepare_time_seconds", &prepare),
            ("fetch_time_seconds", &fetch),
            ("execute_time_seconds", &execute),
            ("total_time_seconds", &total),
            ("query", &query),
        ]),
        1.0,
    );
    Ok(())
}

fn scrape_utrans_detail(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(UTRANS_DETAIL_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "utrans_query_detail",
            labels(&[
                ("session_id", "0"),
                ("client_ip", ""),
                ("client_pid", "0"),
                ("client_app_info", ""),
                ("utrans_time_seconds", "0"),
                ("execute_time_seconds", "0"),
                ("total_time_seconds", "0"),
                ("query", "none"),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let client_ip = rs.value(0, 1).as_text();
    let client_pid = rs.value(0, 2).as_text();
    let client_app = rs.value(0, 3).as_text();
    // UTRANS_TIME is already in seconds (BASE_TIME arithmetic).
    let utrans_time = rs.value(0, 4).as_text();
    let execute = seconds_label(rs.value(0, 5).as_f64());
    let total = seconds_label(rs.value(0, 6).as_f64());
    let query = rs.value(0, 7).as_text();
    ctx.add_labeled(
        "utrans_query_detail",
        labels(&[
            ("session_id", &session_id),
            ("client_ip", &client_ip),
            ("client_pid", &client_pid),
            ("client_app_info", &client_app),
            ("utrans_time_seconds", &utrans_time),
            ("execute_time_seconds", &execute),
            ("total_time_seconds", &total),
            ("query", &query),
        ]),
        1.0,
    );
    Ok(())
}

fn scrape_fullscan_detail(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(FULLSCAN_DETAIL_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "fullscan_query_detail",
            labels(&[
                ("session_id", "0"),
                ("client_ip", ""),
                ("client_pid", "0"),
                ("client_app_info", ""),
                ("prepare_time_seconds", "0"),
                ("fetch_time_seconds", "0"),
                ("execute_time_seconds", "0"),
                ("total_time_seconds", "0"),
                ("query", "none"),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let client_ip = rs.value(0, 1).as_text();
    let client_pid = rs.value(0, 2).as_text();
    let client_app = rs.value(0, 3).as_text();
    let prepare = seconds_label(rs.value(0, 4).as_f64());
    let fetch = seconds_label(rs.value(0, 5).as_f64());
    let execute = seconds_label(rs.value(0, 6).as_f64());
    let total = seconds_label(rs.value(0, 7).as_f64());
    let query = rs.value(0, 8).as_text();
    ctx.add_labeled(
        "fullscan_query_detail",
        labels(&[
            ("session_id", &session_id),
            ("client_ip", &client_ip),
            ("client_pid", &client_pid),
            ("client_app_info", &client_app),
            ("prepare_time_seconds", &prepare),
            ("fetch_time_seconds", &fetch),
            ("execute_time_seconds", &execute),
            ("total_time_seconds", &total),
            ("query", &query),
        ]),
        1.0,
    );
    Ok(())
}

fn scrape_tx_view_scn(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query_with_fallback(TX_VIEW_SCN_SQL, TX_VIEW_SCN_FALLBACK_SQL)?;
    if rs.is_empty() {
        ctx.add_labeled(
            "tx_of_memory_view_scn",
            labels(&[
                ("session_id", "0"),
                ("tx_id", "0"),
                ("total_time_seconds", "0"),
                ("execute_time_seconds", "0"),
                ("query", "none"),
            ]),
            0.0,
        );
        return Ok(());
    }
    let session_id = rs.value(0, 0).as_text();
    let tx_id = rs.value(0, 1).as_text();
    let total = seconds_label(rs.value(0, 2).as_f64());
    let execute = seconds_label(rs.value(0, 3).as_f64());
    let query = rs.value(0, 4).as_text();
    ctx.add_labeled(
        "tx_of_memory_view_scn",
        labels(&[
            ("session_id", &session_id),
            ("tx_id", &tx_id),
            ("total_time_seconds", &total),
            ("execute_time_seconds", &execute),
            ("query", &query),
        ]),
        1.0,
    );
    Ok(())
}
