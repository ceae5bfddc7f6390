//! Datafile physical I/O rankings from V$FILESTAT.

use crate::collectors::context::labels;
use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const FILE_IO_READS_SQL: &str =
    "SELECT B.NAME, A.PHYRDS FROM V$FILESTAT A, V$DATAFILES B \
     WHERE A.SPACEID = B.SPACEID AND A.FILEID = B.ID AND A.PHYRDS > 0 ORDER BY A.PHYRDS DESC LIMIT 10";
pub const FILE_IO_WRITES_SQL: &str =
    "SELECT B.NAME, A.PHYWRTS FROM V$FILESTAT A, V$DATAFILES B \
     WHERE A.SPACEID = B.SPACEID AND A.FILEID = B.ID ORDER BY A.PHYWRTS DESC LIMIT 10";
pub const FILE_IO_WAIT_SQL: &str =
    "SELECT B.NAME, CASE WHEN A.SINGLEBLKRDS > 0 THEN A.SINGLEBLKRDTIM * 1.0 / A.SINGLEBLKRDS ELSE 0 END AS AVERAGE_WAIT \
     FROM V$FILESTAT A, V$DATAFILES B WHERE A.SPACEID = B.SPACEID AND A.FILEID = B.ID AND A.SINGLEBLKRDS > 0";

pub(crate) const TASKS: &[ScrapeTask] = &[
    ScrapeTask::new("file_io_reads", &["file_io_reads"], scrape_file_io_reads),
    ScrapeTask::new("file_io_wait", &["file_io_wait_seconds"], scrape_file_io_wait),
    ScrapeTask::new("file_io_writes", &["file_io_writes"], scrape_file_io_writes),
];

fn scrape_file_io_reads(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_file(ctx, FILE_IO_READS_SQL, "file_io_reads")
}

fn scrape_file_io_writes(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    per_file(ctx, FILE_IO_WRITES_SQL, "file_io_writes")
}

fn per_file(ctx: &mut ScrapeContext<'_>, sql: &str, key: &'static str) -> Result<(), DbError> {
    let rs = ctx.query(sql)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        let count = rs.value(row, 1).as_f64();
        ctx.add_labeled(key, labels(&[("file_name", &name)]), count);
    }
    Ok(())
}

fn scrape_file_io_wait(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(FILE_IO_WAIT_SQL)?;
    for row in 0..rs.rows.len() {
        if rs.value(row, 0).is_null() {
            continue;
        }
        let name = rs.value(row, 0).as_text();
        // AVERAGE_WAIT is in microseconds.
        let wait = rs.value(row, 1).as_f64() / 1e6;
        ctx.add_labeled("file_io_wait_seconds", labels(&[("file_name", &name)]), wait);
    }
    Ok(())
}
