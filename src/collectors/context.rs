//! Per-scrape accumulator. Tasks borrow the context, read rows through
//! [`ScrapeContext::query`], and append labelled data points; the engine
//! turns the accumulated points into snapshots once the scrape ends.

use crate::collectors::config::DisableSet;
use crate::db::{DbError, Executor, ResultSet};
use tracing::debug;

/// Ordered label pairs; order is preserved into the exposition.
pub type LabelSet = Vec<(String, String)>;

/// Build a label set from borrowed pairs.
#[must_use]
pub fn labels(pairs: &[(&str, &str)]) -> LabelSet {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub labels: LabelSet,
    pub value: f64,
}

pub struct ScrapeContext<'a> {
    executor: Option<Box<dyn Executor + 'a>>,
    disabled: &'a DisableSet,
    points: Vec<(&'static str, Vec<DataPoint>)>,
    version: Option<String>,
}

impl<'a> ScrapeContext<'a> {
    #[must_use]
    pub fn with_executor(executor: Box<dyn Executor + 'a>, disabled: &'a DisableSet) -> Self {
        Self {
            executor: Some(executor),
            disabled,
            points: Vec::new(),
            version: None,
        }
    }

    /// No-executor mode: used when connection acquisition failed. Tasks are
    /// not run, but self-metrics are still appended and built.
    #[must_use]
    pub fn detached(disabled: &'a DisableSet) -> Self {
        Self {
            executor: None,
            disabled,
            points: Vec::new(),
            version: None,
        }
    }

    #[must_use]
    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    /// Run one statement on this scrape's executor.
    pub fn query(&mut self, sql: &str) -> Result<ResultSet, DbError> {
        match self.executor.as_mut() {
            Some(exec) => exec.query(sql),
            None => Err(DbError::NoExecutor),
        }
    }

    /// Run a statement and read the first column of the first row as a
    /// number; a missing row reads as 0.
    pub fn query_scalar(&mut self, sql: &str) -> Result<f64, DbError> {
        let rs = self.query(sql)?;
        Ok(rs.value(0, 0).as_f64())
    }

    /// Run `preferred`; on a schema-mismatch error retry once with
    /// `fallback`. Any other error, or a failing fallback, propagates.
    pub fn query_with_fallback(
        &mut self,
        preferred: &str,
        fallback: &str,
    ) -> Result<ResultSet, DbError> {
        match self.query(preferred) {
            Ok(rs) => Ok(rs),
            Err(e) if e.is_schema_mismatch() => {
                debug!(error = %e, "preferred column shape not available, using fallback");
                self.query(fallback)
            }
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn is_disabled(&self, key: &str) -> bool {
        self.disabled.contains(key)
    }

    /// Append a data point with no labels.
    pub fn add(&mut self, key: &'static str, value: f64) {
        self.add_labeled(key, LabelSet::new(), value);
    }

    /// Append a data point with the given labels, preserving their order.
    /// NaN values are dropped.
    pub fn add_labeled(&mut self, key: &'static str, labels: LabelSet, value: f64) {
        if value.is_nan() {
            debug!(key, "dropping NaN data point");
            return;
        }
        let point = DataPoint { labels, value };
        if let Some((_, points)) = self.points.iter_mut().find(|(k, _)| *k == key) {
            points.push(point);
        } else {
            self.points.push((key, vec![point]));
        }
    }

    /// Record the server version reported by the version task.
    pub fn set_version(&mut self, version: String) {
        self.version = Some(version);
    }

    #[must_use]
    pub fn take_version(&mut self) -> Option<String> {
        self.version.take()
    }

    /// Drop the executor handle; point data stays intact.
    pub fn release_executor(&mut self) {
        self.executor = None;
    }

    /// Accumulated points, keyed in insertion order.
    #[must_use]
    pub fn into_points(self) -> Vec<(&'static str, Vec<DataPoint>)> {
        self.points
    }
}
