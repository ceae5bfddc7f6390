//! Operator-defined read-only SQL, loaded from YAML; each result row becomes
//! one gauge sample with label columns plus a value column.
//!
//! Failures are isolated per query: a failing statement is logged at warn
//! and skipped, never affecting other queries or the built-in engine. Each
//! query runs on its own executor.

use crate::collectors::context::DataPoint;
use crate::collectors::snapshot::MetricSnapshot;
use crate::db::{Connection, DbError, ResultSet};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

pub mod loader;

pub use loader::QueryDef;

/// Mandatory prefix for custom metric names; avoids clashes with the
/// built-in `altibase_*` series.
pub const CUSTOM_METRIC_PREFIX: &str = "altibase_custom_";

#[allow(clippy::unwrap_used)]
static LABEL_SANITIZER: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-zA-Z0-9_]").unwrap());

pub struct CustomQueryEngine {
    queries: Vec<QueryDef>,
}

impl CustomQueryEngine {
    #[must_use]
    pub fn new(queries: Vec<QueryDef>) -> Self {
        Self { queries }
    }

    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        Ok(Self::new(loader::load(path)?))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Run every query; failing ones contribute nothing. Queries yielding
    /// zero rows produce no snapshot.
    pub fn collect(&self, conn: &mut dyn Connection) -> Vec<MetricSnapshot> {
        let mut snapshots = Vec::new();
        for query in &self.queries {
            match run_query(conn, query) {
                Ok(Some(snapshot)) => snapshots.push(snapshot),
                Ok(None) => {}
                Err(e) => {
                    warn!(query = %metric_name(&query.name), error = %e, "custom query failed");
                }
            }
        }
        snapshots
    }
}

fn run_query(conn: &mut dyn Connection, query: &QueryDef) -> Result<Option<MetricSnapshot>, DbError> {
    let mut exec = conn.executor()?;
    let rs = exec.query(&query.sql)?;
    drop(exec);

    if rs.is_empty() {
        return Ok(None);
    }

    let label_columns = match &query.label_columns {
        Some(columns) => columns.clone(),
        None => infer_label_columns(&rs),
    };
    let value_col = find_value_column(&rs, &label_columns);

    let mut points = Vec::with_capacity(rs.rows.len());
    for row in 0..rs.rows.len() {
        let mut point_labels = Vec::with_capacity(label_columns.len());
        for column in &label_columns {
            let value = rs
                .col(column)
                .map(|c| rs.value(row, c).as_text())
                .unwrap_or_default();
            point_labels.push((sanitize_label_name(column), value));
        }
        let value = rs.value(row, value_col).as_f64();
        points.push(DataPoint {
            labels: point_labels,
            value,
        });
    }

    Ok(Some(MetricSnapshot::gauge(
        metric_name(&query.name),
        query.help.clone(),
        points,
    )))
}

/// With no explicit label_columns, every column except the last is a label.
fn infer_label_columns(rs: &ResultSet) -> Vec<String> {
    let count = rs.columns.len().saturating_sub(1);
    rs.columns.iter().take(count).cloned().collect()
}

/// The value column is the first one labelled `value` (case-insensitive); if
/// none, the first non-label column; else the last column.
fn find_value_column(rs: &ResultSet, label_columns: &[String]) -> usize {
    for (i, column) in rs.columns.iter().enumerate() {
        if column.eq_ignore_ascii_case("value") {
            return i;
        }
        let is_label = label_columns
            .iter()
            .any(|l| l.eq_ignore_ascii_case(column));
        if !is_label {
            return i;
        }
    }
    rs.columns.len().saturating_sub(1)
}

#[must_use]
pub fn metric_name(name: &str) -> String {
    if name.is_empty() {
        return format!("{CUSTOM_METRIC_PREFIX}unnamed");
    }
    if name.starts_with(CUSTOM_METRIC_PREFIX) {
        name.to_string()
    } else {
        format!("{CUSTOM_METRIC_PREFIX}{name}")
    }
}

/// Restrict label names to `[a-z0-9_]`. Names that would collide with the
/// reserved `__`-prefixed space are reduced to a single leading underscore.
#[must_use]
pub fn sanitize_label_name(name: &str) -> String {
    let sanitized = LABEL_SANITIZER.replace_all(name, "_").to_lowercase();
    if sanitized.starts_with("__") {
        format!("_{}", sanitized.trim_start_matches('_'))
    } else {
        sanitized
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::mock::MockConnection;
    use crate::db::Value;

    fn query(name: &str, sql: &str, label_columns: Option<Vec<&str>>) -> QueryDef {
        QueryDef {
            name: name.to_string(),
            help: "h".to_string(),
            sql: sql.to_string(),
            label_columns: label_columns
                .map(|cols| cols.into_iter().map(ToString::to_string).collect()),
        }
    }

    #[test]
    fn last_column_is_the_value_when_labels_are_inferred() {
        let mut conn = MockConnection::new().with_result(
            "SELECT 'a' AS region, 5 AS value",
            &["REGION", "VALUE"],
            vec![vec![Value::Text("a".into()), Value::Number(5.0)]],
        );
        let engine = CustomQueryEngine::new(vec![query(
            "q1",
            "SELECT 'a' AS region, 5 AS value",
            None,
        )]);
        let snapshots = engine.collect(&mut conn);

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name, "altibase_custom_q1");
        assert_eq!(snapshots[0].points.len(), 1);
        assert_eq!(
            snapshots[0].points[0].labels,
            vec![("region".to_string(), "a".to_string())]
        );
        assert_eq!(snapshots[0].points[0].value, 5.0);
    }

    #[test]
    fn explicit_label_columns_match_case_insensitively() {
        let sql = "SELECT rep_name, cnt FROM t";
        let mut conn = MockConnection::new().with_result(
            sql,
            &["REP_NAME", "CNT"],
            vec![vec![Value::Text("r1".into()), Value::Number(3.0)]],
        );
        let engine = CustomQueryEngine::new(vec![query("reps", sql, Some(vec!["rep_name"]))]);
        let snapshots = engine.collect(&mut conn);

        assert_eq!(
            snapshots[0].points[0].labels,
            vec![("rep_name".to_string(), "r1".to_string())]
        );
        // CNT is the first non-label column.
        assert_eq!(snapshots[0].points[0].value, 3.0);
    }

    #[test]
    fn value_named_column_wins_over_position() {
        let sql = "SELECT value, region FROM t";
        let mut conn = MockConnection::new().with_result(
            sql,
            &["VALUE", "REGION"],
            vec![vec![Value::Number(9.0), Value::Text("eu".into())]],
        );
        let engine = CustomQueryEngine::new(vec![query("q", sql, Some(vec!["region"]))]);
        let snapshots = engine.collect(&mut conn);

        assert_eq!(snapshots[0].points[0].value, 9.0);
        assert_eq!(
            snapshots[0].points[0].labels,
            vec![("region".to_string(), "eu".to_string())]
        );
    }

    #[test]
    fn zero_rows_produce_no_snapshot() {
        let sql = "SELECT x, y FROM empty";
        let mut conn = MockConnection::new().with_result(sql, &["X", "Y"], vec![]);
        let engine = CustomQueryEngine::new(vec![query("q", sql, None)]);
        assert!(engine.collect(&mut conn).is_empty());
    }

    #[test]
    fn failing_query_is_isolated() {
        let bad = "SELECT broken";
        let good = "SELECT 'a' AS region, 1 AS value";
        let mut conn = MockConnection::new()
            .with_error(bad, "syntax error")
            .with_result(
                good,
                &["REGION", "VALUE"],
                vec![vec![Value::Text("a".into()), Value::Number(1.0)]],
            );
        let engine = CustomQueryEngine::new(vec![query("bad", bad, None), query("good", good, None)]);
        let snapshots = engine.collect(&mut conn);

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name, "altibase_custom_good");
    }

    #[test]
    fn null_label_values_become_empty_strings() {
        let sql = "SELECT region, value FROM t";
        let mut conn = MockConnection::new().with_result(
            sql,
            &["REGION", "VALUE"],
            vec![vec![Value::Null, Value::Number(2.0)]],
        );
        let engine = CustomQueryEngine::new(vec![query("q", sql, None)]);
        let snapshots = engine.collect(&mut conn);
        assert_eq!(
            snapshots[0].points[0].labels,
            vec![("region".to_string(), String::new())]
        );
    }

    #[test]
    fn metric_name_prefixes_once() {
        assert_eq!(metric_name("q1"), "altibase_custom_q1");
        assert_eq!(metric_name("altibase_custom_q1"), "altibase_custom_q1");
        assert_eq!(metric_name(""), "altibase_custom_unnamed");
    }

    #[test]
    fn label_names_are_sanitized() {
        assert_eq!(sanitize_label_name("Rep Name"), "rep_name");
        assert_eq!(sanitize_label_name("COL-1"), "col_1");
        assert_eq!(sanitize_label_name("__name__"), "_name__");
    }
}
