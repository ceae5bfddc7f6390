//! Service thread counts grouped by type, state and run mode.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const SERVICE_THREAD_SQL: &str = "SELECT TYPE AS NAME, COUNT(*) AS CNT FROM V$SERVICE_THREAD GROUP BY TYPE \
     UNION ALL SELECT STATE AS NAME, COUNT(*) AS CNT FROM V$SERVICE_THREAD GROUP BY STATE \
     UNION ALL SELECT RUN_MODE AS NAME, COUNT(*) AS CNT FROM V$SERVICE_THREAD GROUP BY RUN_MODE";

pub(crate) const TASKS: &[ScrapeTask] = &[ScrapeTask::new(
    "service_threads",
    &["service_thread_count"],
    scrape_service_threads,
)];

fn scrape_service_threads(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(SERVICE_THREAD_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let count = rs.value(row, 1).as_f64();
        ctx.add_labeled(
            "service_thread_count",
            labels(&[("kind", "thread"), ("value", &name)]),
            count,
        );
    }
    Ok(())
}
