//! Session and statement counts, split by total/active status.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const TOTAL_SESSIONS_SQL: &str = "SELECT COUNT(*) FROM V$SESSION";
pub const ACTIVE_SESSIONS_SQL: &str = "SELECT COUNT(*) FROM V$SESSION WHERE ACTIVE_FLAG = 1";
pub const TOTAL_STATEMENTS_SQL: &str = "SELECT COUNT(*) FROM V$STATEMENT";
pub const ACTIVE_STATEMENTS_SQL: &str = "SELECT COUNT(*) FROM V$STATEMENT WHERE EXECUTE_FLAG = 1";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("sessions", &["sessions"], scrape_sessions),
    ScrapeTask::new("statements", &["statements"], scrape_statements),
];

fn scrape_sessions(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let total = ctx.query_scalar(TOTAL_SESSIONS_SQL)?;
    let active = ctx.query_scalar(ACTIVE_SESSIONS_SQL)?;
    ctx.add_labeled("sessions", labels(&[("status", "total")]), total);
    ctx.add_labeled("sessions", labels(&[("status", "active")]), active);
    Ok(())
}

fn scrape_statements(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let total = ctx.query_scalar(TOTAL_STATEMENTS_SQL)?;
    let active = ctx.query_scalar(ACTIVE_STATEMENTS_SQL)?;
    ctx.add_labeled("statements", labels(&[("status", "total")]), total);
    ctx.add_labeled("statements", labels(&[("status", "active")]), active);
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
    fn statements_emit_both_statuses() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new()
            .with_result(
                TOTAL_STATEMENTS_SQL,
                &["COUNT"],
                vec![vec![Value::Number(12.0)]],
            )
            .with_result(
                ACTIVE_STATEMENTS_SQL,
                &["COUNT"],
                vec![vec![Value::Number(5.0)]],
            );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_statements(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].0, "statements");
        assert_eq!(points[0].1.len(), 2);
        assert_eq!(points[0].1[0].value, 12.0);
        assert_eq!(points[0].1[1].value, 5.0);
    }
}
