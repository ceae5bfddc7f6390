//! Wait event rankings, system- and session-scoped, excluding the Idle
//! class. TIME_WAITED is in microseconds.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const SYSTEM_EVENT_SQL: &str =
    "SELECT EVENT || '(' || WAIT_CLASS || ')' AS NAME, TIME_WAITED FROM V$SYSTEM_EVENT \
     WHERE WAIT_CLASS != 'Idle' ORDER BY TIME_WAITED DESC LIMIT 10";
pub const SESSION_EVENT_SQL: &str =
    "SELECT EVENT || '(' || WAIT_CLASS || ')' AS NAME, TIME_WAITED FROM V$SESSION_EVENT \
     WHERE WAIT_CLASS != 'Idle' ORDER BY TIME_WAITED DESC LIMIT 10";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new(
        "session_event",
        &["session_event_time_waited_seconds"],
        scrape_session_event,
    ),
    ScrapeTask::new(
        "system_event",
        &["system_event_time_waited_seconds"],
        scrape_system_event,
    ),
];

fn scrape_system_event(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_event(ctx, SYSTEM_EVENT_SQL, "system_event_time_waited_seconds")
}

fn scrape_session_event(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_event(ctx, SESSION_EVENT_SQL, "session_event_time_waited_seconds")
}

fn per_event(ctx: &mut ScrapeContext<'_>, sql: &str, key: &'static str) -> Result<(), DbError> {
    let rs = ctx.query(sql)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let event = rs.value(row, 0).as_text();
        let waited = rs.value(row, 1).as_f64() / 1e6;
        ctx.add_labeled(key, labels(&[("event", &event)]), waited);
    }
    Ok(())
}
