//! Instance-level scalars: working time, archive state, logfile positions,
//! buffer pool health.

use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const WORKING_TIME_SQL: &str = "SELECT WORKING_TIME_SEC FROM V$INSTANCE";
pub const ARCHIVE_MODE_SQL: &str = "SELECT ARCHIVE_MODE FROM V$ARCHIVE";
pub const LOGFILE_SQL: &str =
    "SELECT OLDEST_ACTIVE_LOGFILE, CURRENT_LOGFILE, (CURRENT_LOGFILE - OLDEST_ACTIVE_LOGFILE) FROM V$ARCHIVE";
pub const LF_PREPARE_WAIT_SQL: &str = "SELECT LF_PREPARE_WAIT_COUNT FROM V$LFG";
pub const BUFFER_POOL_SQL: &str = "SELECT HIT_RATIO, VICTIM_FAILS FROM V$BUFFPOOL_STAT";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("archive_mode", &["archive_mode"], scrape_archive_mode),
    ScrapeTask::new(
        "buffer_pool",
        &["buffer_pool_hit_ratio", "buffer_pool_victim_fails"],
        scrape_buffer_pool,
    ),
    ScrapeTask::new(
        "instance_working_time",
        &["instance_working_time_seconds"],
        scrape_working_time,
    ),
    ScrapeTask::new("lf_prepare_wait", &["lf_prepare_wait_count"], scrape_lf_prepare_wait),
    ScrapeTask::new(
        "logfile",
        &["logfile_oldest", "logfile_current", "logfile_gap"],
        scrape_logfile,
    ),
];

fn scrape_working_time(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let working_time = ctx.query_scalar(WORKING_TIME_SQL)?;
    ctx.add("instance_working_time_seconds", working_time);
    Ok(())
}

fn scrape_archive_mode(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let mode = ctx.query_scalar(ARCHIVE_MODE_SQL)?;
    ctx.add("archive_mode", mode);
    Ok(())
}

fn scrape_lf_prepare_wait(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let waits = ctx.query_scalar(LF_PREPARE_WAIT_SQL)?;
    ctx.add("lf_prepare_wait_count", waits);
    Ok(())
}

fn scrape_buffer_pool(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(BUFFER_POOL_SQL)?;
    if !rs.is_empty() {
        if !ctx.is_disabled("buffer_pool_hit_ratio") {
            ctx.add("buffer_pool_hit_ratio", rs.value(0, 0).as_f64());
        }
        if !ctx.is_disabled("buffer_pool_victim_fails") {
            ctx.add("buffer_pool_victim_fails", rs.value(0, 1).as_f64());
        }
    }
    Ok(())
}

fn scrape_logfile(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(LOGFILE_SQL)?;
    if !rs.is_empty() {
        if !ctx.is_disabled("logfile_oldest") {
            ctx.add("logfile_oldest", rs.value(0, 0).as_f64());
        }
        if !ctx.is_disabled("logfile_current") {
            ctx.add("logfile_current", rs.value(0, 1).as_f64());
        }
        if !ctx.is_disabled("logfile_gap") {
            ctx.add("logfile_gap", rs.value(0, 2).as_f64());
        }
    }
    Ok(())
}
