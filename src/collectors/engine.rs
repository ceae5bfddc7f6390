//! Per-scrape orchestration: runs every enabled task against one executor,
//! applies the disable-list and schema-tolerance policy, and emits the
//! self-metrics and info series.

use crate::collectors::config::DisableSet;
use crate::collectors::context::ScrapeContext;
use crate::collectors::snapshot::{self, MetricSnapshot, Snapshots};
use crate::collectors::{all_tasks, catalog};
use crate::db::Connection;
use std::sync::RwLock;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const UNKNOWN_VERSION: &str = "unknown";

pub struct ScrapeEngine {
    disabled: DisableSet,
    exporter_version: String,
    /// Product version reported by the last successful version read. Once a
    /// real version is seen it is never overwritten by an empty reading, so
    /// the info series survives scrapes that fail mid-way.
    last_version: RwLock<String>,
}

impl ScrapeEngine {
    /// Builds the engine and runs the task/catalog self-test; a task
    /// declaring a key missing from the catalog is a programmer error and
    /// fails startup.
    pub fn new(disabled: DisableSet) -> anyhow::Result<Self> {
        catalog::verify_tasks()?;
        Ok(Self {
            disabled,
            exporter_version: env!("CARGO_PKG_VERSION").to_string(),
            last_version: RwLock::new(UNKNOWN_VERSION.to_string()),
        })
    }

    /// One scrape. Never fails: at minimum the two self-metrics and the two
    /// info series are returned.
    pub fn collect(&self, conn: &mut dyn Connection) -> Snapshots {
        let start = Instant::now();
        let mut success = 1.0;

        let mut ctx = match conn.executor() {
            Ok(exec) => ScrapeContext::with_executor(exec, &self.disabled),
            Err(e) => {
                error!(error = %e, "failed to acquire executor, skipping all tasks");
                success = 0.0;
                ScrapeContext::detached(&self.disabled)
            }
        };

        if ctx.has_executor() {
            for task in all_tasks() {
                if task.skip_when_all_disabled
                    && task.keys.iter().all(|key| self.disabled.contains(key))
                {
                    debug!(task = task.name, "all keys disabled, skipping");
                    continue;
                }
                if let Err(e) = (task.run)(&mut ctx) {
                    if task.catch_schema_error {
                        warn!(
                            task = task.name,
                            error = %e,
                            "scrape skipped (catalog schema may differ across Altibase versions)"
                        );
                    } else {
                        error!(task = task.name, error = %e, "scrape failed, aborting remaining tasks");
                        success = 0.0;
                        break;
                    }
                }
            }
        }

        ctx.release_executor();

        if let Some(version) = ctx.take_version() {
            self.update_version(&version);
        }

        let duration = start.elapsed().as_secs_f64();
        ctx.add("exporter_last_scrape_success", success);
        ctx.add("scrape_duration_seconds", duration);

        if success == 1.0 {
            info!(
                duration_seconds = duration,
                version = %self.last_version(),
                "scrape completed"
            );
        }

        let gauges = snapshot::families_from_points(ctx.into_points());
        let infos = vec![
            MetricSnapshot::info(
                &catalog::name("exporter_build"),
                catalog::help("exporter_build"),
                "version",
                &self.exporter_version,
            ),
            MetricSnapshot::info(
                &catalog::name("version"),
                catalog::help("version"),
                "version",
                &self.last_version(),
            ),
        ];

        Snapshots { gauges, infos }
    }

    #[must_use]
    pub fn last_version(&self) -> String {
        let guard = match self.last_version.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("last_version lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.clone()
    }

    fn update_version(&self, version: &str) {
        let version = version.trim();
        if version.is_empty() || version == UNKNOWN_VERSION {
            return;
        }
        let mut guard = match self.last_version.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("last_version lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *guard = version.to_string();
    }
}
