//! Tablespace size, state and usage (memory tablespaces).

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const TABLESPACE_TOTAL_SQL: &str =
    "SELECT NAME, TOTAL_PAGE_COUNT * PAGE_SIZE AS TOTAL FROM V$TABLESPACES T, V$MEM_TABLESPACES M WHERE T.ID = M.SPACE_ID";
pub const TABLESPACE_STATE_SQL: &str =
    "SELECT NAME, DECODE(STATE, 1, 0, 2, 1, 0) AS ONLINE FROM V$TABLESPACES";
pub const TABLESPACE_USAGE_SQL: &str =
    "SELECT T.NAME, (M.ALLOC_PAGE_COUNT - M.FREE_PAGE_COUNT) * T.PAGE_SIZE * 1.0 / NULLIF(T.TOTAL_PAGE_COUNT * T.PAGE_SIZE, 0) AS USAGE \
     FROM V$TABLESPACES T, V$MEM_TABLESPACES M WHERE T.ID = M.SPACE_ID";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("tablespace_state", &["tablespace_state"], scrape_tablespace_state),
    ScrapeTask::new("tablespace_total", &["tablespace_total_bytes"], scrape_tablespace_total),
    ScrapeTask::new("tablespace_usage", &["tablespace_usage_ratio"], scrape_tablespace_usage),
];

fn scrape_tablespace_total(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(TABLESPACE_TOTAL_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let total = rs.value(row, 1).as_f64();
        ctx.add_labeled("tablespace_total_bytes", labels(&[("tbs_name", &name)]), total);
    }
    Ok(())
}

fn scrape_tablespace_state(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(TABLESPACE_STATE_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let online = rs.value(row, 1).as_f64();
        let state = if online == 1.0 { "ONLINE" } else { "OFFLINE" };
        ctx.add_labeled(
            "tablespace_state",
            labels(&[("tbs_name", &name), ("state", state)]),
            online,
        );
    }
    Ok(())
}

fn scrape_tablespace_usage(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(TABLESPACE_USAGE_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let usage = rs.value(row, 1).as_f64();
        ctx.add_labeled("tablespace_usage_ratio", labels(&[("tbs_name", &name)]), usage);
    }
    Ok(())
}
