//! V$SYSSTAT counters. SEQNUM < 88 bounds the set to the stable, documented
//! statistics.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const SYSSTAT_SQL: &str = "SELECT NAME, VALUE FROM V$SYSSTAT WHERE SEQNUM < 88";

pub(crate) const TASKS: &[ScrapeTask] =
    &[ScrapeTask::new("sysstat", &["sysstat"], scrape_sysstat)];

fn scrape_sysstat(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(SYSSTAT_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let value = rs.value(row, 1).as_f64();
        ctx.add_labeled("sysstat", labels(&[("name", &name)]), value);
    }
    Ok(())
}
