//! Memory accounting: V$MEMSTAT totals and rankings, garbage-collector gap,
//! table/queue/segment usage.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const MEMSTAT_TOTALS_SQL: &str =
    "SELECT SUM(MAX_TOTAL_SIZE), SUM(ALLOC_SIZE) FROM V$MEMSTAT";
pub const MEMSTAT_BY_NAME_SQL: &str =
    "SELECT NAME, MAX_TOTAL_SIZE, ALLOC_SIZE FROM V$MEMSTAT ORDER BY MAX_TOTAL_SIZE DESC LIMIT 10";
pub const MEMSTAT_USAGE_RATIO_SQL: &str =
    "SELECT A.NAME, A.MAX_TOTAL_SIZE / B.TOTAL_USAGE AS USAGE_PERCENTAGE FROM V$MEMSTAT A, \
     (SELECT SUM(MAX_TOTAL_SIZE) AS TOTAL_USAGE FROM V$MEMSTAT) B \
     ORDER BY USAGE_PERCENTAGE DESC LIMIT 10";
pub const GC_GAP_SQL: &str =
    "SELECT GC_NAME, ADD_OID_CNT - GC_OID_CNT AS GC_GAP FROM V$MEMGC";
pub const MEMORY_TABLE_USAGE_SQL: &str =
    "SELECT SUM(FIXED_ALLOC_MEM) + SUM(VAR_ALLOC_MEM) FROM V$MEMTBL_INFO";
pub const DISK_TABLE_USAGE_SQL: &str =
    "SELECT SUM(DISK_TOTAL_PAGE_CNT * 8192) FROM V$DISKTBL_INFO";
pub const MEMORY_TABLE_PER_TABLE_SQL: &str =
    "SELECT TABLE_NAME, (FIXED_ALLOC_MEM+VAR_ALLOC_MEM) AS ALLOC FROM SYSTEM_.SYS_TABLES_ A, V$MEMTBL_INFO B \
     WHERE A.USER_ID != 1 AND A.TABLE_OID = B.TABLE_OID ORDER BY ALLOC DESC LIMIT 5";
pub const DISK_TABLE_PER_TABLE_SQL: &str =
    "SELECT C.TABLE_NAME, B.DISK_TOTAL_PAGE_CNT * A.PAGE_SIZE AS ALLOC FROM V$TABLESPACES A, V$DISKTBL_INFO B, SYSTEM_.SYS_TABLES_ C \
     WHERE A.ID = B.TABLESPACE_ID AND B.TABLE_OID = C.TABLE_OID ORDER BY ALLOC DESC LIMIT 5";
pub const QUEUE_USAGE_SQL: &str =
    "SELECT B.TABLE_NAME, C.FIXED_ALLOC_MEM+C.VAR_ALLOC_MEM AS ALLOC FROM SYSTEM_.SYS_USERS_ A, SYSTEM_.SYS_TABLES_ B, V$MEMTBL_INFO C, V$TABLESPACES D \
     WHERE A.USER_NAME <> 'SYSTEM_' AND B.TABLE_TYPE = 'Q' AND A.USER_ID = B.USER_ID AND B.TABLE_OID = C.TABLE_OID AND B.TBS_ID = D.ID";
pub const SEGMENT_USAGE_SQL: &str =
    "SELECT A.NAME, SUM(B.EXTENT_TOTAL_COUNT*A.EXTENT_PAGE_COUNT*A.PAGE_SIZE) AS USAGE FROM V$TABLESPACES A, V$SEGMENT B \
     WHERE A.ID = B.SPACE_ID GROUP BY A.NAME";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("disk_table_usage", &["disk_table_usage_bytes"], scrape_disk_table_usage),
    ScrapeTask::new(
        "disk_table_usage_per_table",
        &["disk_table_usage_bytes_per_table"],
        scrape_disk_table_usage_per_table,
    ),
    ScrapeTask::new("gc_gap", &["gc_gap"], scrape_gc_gap),
    ScrapeTask::new(
        "memory_table_usage",
        &["memory_table_usage_bytes"],
        scrape_memory_table_usage,
    ),
    ScrapeTask::new(
        "memory_table_usage_per_table",
        &["memory_table_usage_bytes_per_table"],
        scrape_memory_table_usage_per_table,
    ),
    ScrapeTask::new("memstat_by_name", &["memstat_bytes"], scrape_memstat_by_name),
    ScrapeTask::new(
        "memstat_totals",
        &["memstat_max_total_bytes", "memstat_alloc_bytes"],
        scrape_memstat_totals,
    ),
    ScrapeTask::new("memstat_usage_ratio", &["memstat_usage_ratio"], scrape_memstat_usage_ratio),
    ScrapeTask::new("queue_usage", &["queue_usage_bytes"], scrape_queue_usage),
    ScrapeTask::tolerant("segment_usage", &["segment_usage_bytes"], scrape_segment_usage),
];

fn scrape_memstat_totals(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(MEMSTAT_TOTALS_SQL)?;
    if !rs.is_empty() {
        if !ctx.is_disabled("memstat_max_total_bytes") {
            ctx.add("memstat_max_total_bytes", rs.value(0, 0).as_f64());
        }
        if !ctx.is_disabled("memstat_alloc_bytes") {
            ctx.add("memstat_alloc_bytes", rs.value(0, 1).as_f64());
        }
    }
    Ok(())
}

fn scrape_memstat_by_name(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(MEMSTAT_BY_NAME_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text().trim().to_string();
        let max_total = rs.value(row, 1).as_f64();
        let alloc = rs.value(row, 2).as_f64();
        ctx.add_labeled(
            "memstat_bytes",
            labels(&[("name", &name), ("type", "max_total_size")]),
            max_total,
        );
        ctx.add_labeled(
            "memstat_bytes",
            labels(&[("name", &name), ("type", "alloc_size")]),
            alloc,
        );
    }
    Ok(())
}

fn scrape_memstat_usage_ratio(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(MEMSTAT_USAGE_RATIO_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text().trim().to_string();
        let ratio = rs.value(row, 1).as_f64();
        ctx.add_labeled("memstat_usage_ratio", labels(&[("name", &name)]), ratio);
    }
    Ok(())
}

fn scrape_gc_gap(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(GC_GAP_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let gap = rs.value(row, 1).as_f64();
        ctx.add_labeled("gc_gap", labels(&[("gc_name", &name)]), gap);
    }
    Ok(())
}

fn scrape_memory_table_usage(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let usage = ctx.query_scalar(MEMORY_TABLE_USAGE_SQL)?;
    ctx.add("memory_table_usage_bytes", usage);
    Ok(())
}

fn scrape_disk_table_usage(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let usage = ctx.query_scalar(DISK_TABLE_USAGE_SQL)?;
    ctx.add("disk_table_usage_bytes", usage);
    Ok(())
}

fn scrape_memory_table_usage_per_table(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_table(ctx, MEMORY_TABLE_PER_TABLE_SQL, "memory_table_usage_bytes_per_table")
}

fn scrape_disk_table_usage_per_table(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_table(ctx, DISK_TABLE_PER_TABLE_SQL, "disk_table_usage_bytes_per_table")
}

fn scrape_queue_usage(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_table(ctx, QUEUE_USAGE_SQL, "queue_usage_bytes")
}

fn per_table(ctx: &mut ScrapeContext<'_>, sql: &str, key: &'static str) -> Result<(), DbError> {
    let rs = ctx.query(sql)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let alloc = rs.value(row, 1).as_f64();
        ctx.add_labeled(key, labels(&[("table_name", &name)]), alloc);
    }
    Ok(())
}

fn scrape_segment_usage(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(SEGMENT_USAGE_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let usage = rs.value(row, 1).as_f64();
        ctx.add_labeled("segment_usage_bytes", labels(&[("name", &name)]), usage);
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
    fn memstat_by_name_emits_two_typed_points_per_row() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            MEMSTAT_BY_NAME_SQL,
            &["NAME", "MAX_TOTAL_SIZE", "ALLOC_SIZE"],
            vec![vec![
                Value::Text(" Storage_Memory_Manager ".into()),
                Value::Number(1024.0),
                Value::Number(512.0),
            ]],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_memstat_by_name(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].1.len(), 2);
        assert_eq!(
            points[0].1[0].labels,
            labels(&[("name", "Storage_Memory_Manager"), ("type", "max_total_size")])
        );
        assert_eq!(points[0].1[1].value, 512.0);
    }

    #[test]
    fn usage_ratio_drops_nan_rows() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            MEMSTAT_USAGE_RATIO_SQL,
            &["NAME", "USAGE_PERCENTAGE"],
            vec![
                vec![Value::Text("A".into()), Value::Number(0.5)],
                vec![Value::Text("B".into()), Value::Number(f64::NAN)],
            ],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_memstat_usage_ratio(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].1.len(), 1);
        assert_eq!(points[0].1[0].value, 0.5);
    }

    #[test]
    fn totals_honor_per_key_disable() {
        let disabled = DisableSet::parse("memstat_alloc_bytes");
        let mut conn = MockConnection::new().with_result(
            MEMSTAT_TOTALS_SQL,
            &["SUM1", "SUM2"],
            vec![vec![Value::Number(100.0), Value::Number(60.0)]],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_memstat_totals(&mut ctx).unwrap();

        let points = ctx.into_points();
        let keys: Vec<_> = points.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["memstat_max_total_bytes"]);
    }

    #[test]
    fn null_totals_read_as_zero() {
        let disabled = DisableSet::default();
        let mut conn = MockConnection::new().with_result(
            MEMSTAT_TOTALS_SQL,
            &["SUM1", "SUM2"],
            vec![vec![Value::Null, Value::Null]],
        );
        let exec = conn.executor().unwrap();
        let mut ctx = ScrapeContext::with_executor(exec, &disabled);
        scrape_memstat_totals(&mut ctx).unwrap();

        let points = ctx.into_points();
        assert_eq!(points[0].1[0].value, 0.0);
        assert_eq!(points[1].1[0].value, 0.0);
    }
}
