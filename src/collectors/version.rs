//! Reads the server product version into the engine's cache; surfaced as the
//! `altibase_version` info series rather than a gauge of its own.

use crate::collectors::{ScrapeContext, ScrapeTask};
use crate::db::DbError;

pub const VERSION_SQL: &str = "SELECT PRODUCT_VERSION FROM V$VERSION";

pub(crate) const TASKS: &[ScrapeTask] =
    &[ScrapeTask::new("version", &["version"], scrape_version)];

fn scrape_version(ctx: &mut ScrapeContext<'_>) -> Result<(), DbError> {
    let rs = ctx.query(VERSION_SQL)?;
    if !rs.is_empty() {
        ctx.set_version(rs.value(0, 0).as_text().trim().to_string());
    }
    Ok(())
}
