//! Executor seam between the scrape engine and the database driver.
//!
//! The engine is written against [`Connection`] and [`Executor`] so that the
//! scrape logic stays independent of how rows actually reach the process.
//! The shipped driver lives in [`odbc`] behind the `odbc` cargo feature;
//! tests use the scripted executor in [`mock`].

use thiserror::Error;

pub mod mock;

#[cfg(feature = "odbc")]
pub mod odbc;

/// Client identity registered with the server at startup so the exporter's
/// own sessions can be filtered out of full-scan and long-running reports.
pub const CLIENT_INFO: &str = "altibase-exporter";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("sql error: {0}")]
    Sql(String),

    #[error("no executor available for this scrape")]
    NoExecutor,
}

impl DbError {
    /// Whether this error reports a column missing from the catalog schema,
    /// the signature of cross-version `V$` view drift.
    #[must_use]
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            Self::Sql(msg) => msg.to_lowercase().contains("column not found"),
            _ => false,
        }
    }
}

/// One SQL value. Drivers may deliver every column as [`Value::Text`]; the
/// accessors implement the exporter's conversion rules uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric reading: SQL NULL maps to 0, unparsable text maps to 0.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    /// Label reading: SQL NULL maps to the empty string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Integral doubles render without a trailing `.0` so numeric label values
/// read like the server printed them.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A fully-fetched result: column labels plus rows in server order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Case-insensitive column lookup by result label.
    #[must_use]
    pub fn col(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn has_col(&self, name: &str) -> bool {
        self.col(name).is_some()
    }

    /// Value at `(row, col)`; out-of-range reads behave as SQL NULL.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> &Value {
        const NULL: &Value = &Value::Null;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(NULL)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Short-lived handle for running statements within one scrape.
pub trait Executor {
    fn query(&mut self, sql: &str) -> Result<ResultSet, DbError>;
}

/// The process-lifetime database connection. Exactly one executor is live at
/// a time; callers obtain a fresh one per scrape (or per custom query).
pub trait Connection: Send {
    fn executor(&mut self) -> Result<Box<dyn Executor + '_>, DbError>;

    /// Lightweight validation round-trip, used at startup.
    fn ping(&mut self) -> Result<(), DbError>;
}

/// Registers the exporter's client identity with the server. Best effort:
/// failures are logged at debug and otherwise ignored.
pub fn register_client_info(conn: &mut dyn Connection) {
    let result = conn
        .executor()
        .and_then(|mut exec| exec.query(&format!("exec set_client_info('{CLIENT_INFO}')")));
    if let Err(e) = result {
        tracing::debug!(error = %e, "set_client_info not accepted by server");
    }
}
