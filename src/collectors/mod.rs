use crate::db::DbError;
use once_cell::sync::Lazy;

#[macro_use]
mod register_macro;

pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod snapshot;

pub use context::ScrapeContext;

/// A self-describing scrape unit: the metric keys it emits and the routine
/// that reads rows from the executor and appends data points.
#[derive(Clone, Copy)]
pub struct ScrapeTask {
    pub name: &'static str,
    pub keys: &'static [&'static str],
    /// Survive SQL errors: log at warn, contribute nothing this scrape.
    pub catch_schema_error: bool,
    /// Skip the task entirely when every declared key is disabled.
    pub skip_when_all_disabled: bool,
    pub run: fn(&mut ScrapeContext<'_>) -> Result<(), DbError>,
}

impl ScrapeTask {
    #[must_use]
    pub const fn new(
        name: &'static str,
        keys: &'static [&'static str],
        run: fn(&mut ScrapeContext<'_>) -> Result<(), DbError>,
    ) -> Self {
        Self {
            name,
            keys,
            catch_schema_error: false,
            skip_when_all_disabled: true,
            run,
        }
    }

    /// A task that tolerates SQL errors, declared for views whose column
    /// set drifts across Altibase versions.
    #[must_use]
    pub const fn tolerant(
        name: &'static str,
        keys: &'static [&'static str],
        run: fn(&mut ScrapeContext<'_>) -> Result<(), DbError>,
    ) -> Self {
        Self {
            name,
            keys,
            catch_schema_error: true,
            skip_when_all_disabled: true,
            run,
        }
    }
}

/// Render a microsecond reading as a seconds label value ("1.5", "0").
pub(crate) fn seconds_label(microseconds: f64) -> String {
    format!("{}", microseconds / 1e6)
}

// THIS IS THE ONLY PLACE YOU NEED TO ADD NEW TASK MODULES ✨
register_collectors! {
    events,
    fileio,
    instance,
    locks,
    memory,
    queries,
    replication,
    sessions,
    sysstat,
    tablespace,
    threads,
    version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_are_sorted_by_name() {
        let names: Vec<_> = all_tasks().iter().map(|t| t.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn task_names_are_unique() {
        let mut names: Vec<_> = all_tasks().iter().map(|t| t.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn every_task_declares_at_least_one_key() {
        for task in all_tasks() {
            assert!(!task.keys.is_empty(), "task {} has no keys", task.name);
        }
    }
}
