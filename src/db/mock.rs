//! Scripted connection used by the test suite: SQL text maps to a canned
//! result set or error. Statements with no script entry yield an empty
//! result, which matches how scalar tasks treat a missing row (value 0) and
//! how detail tasks fall back to their placeholder sample.

use super::{Connection, DbError, Executor, ResultSet, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Outcome = Result<ResultSet, String>;

#[derive(Clone, Default)]
pub struct MockConnection {
    scripts: Arc<Mutex<HashMap<String, Outcome>>>,
    executors_refused: Arc<Mutex<bool>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `sql` to return the given columns and rows.
    #[must_use]
    pub fn with_result(self, sql: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let rs = ResultSet::new(columns.iter().map(|c| (*c).to_string()).collect(), rows);
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(normalize(sql), Ok(rs));
        }
        self
    }

    /// Script `sql` to fail with the given SQL error message.
    #[must_use]
    pub fn with_error(self, sql: &str, message: &str) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(normalize(sql), Err(message.to_string()));
        }
        self
    }

    /// Make every `executor()` call fail, simulating a dead connection.
    #[must_use]
    pub fn refusing_executors(self) -> Self {
        if let Ok(mut refused) = self.executors_refused.lock() {
            *refused = true;
        }
        self
    }

    /// Every statement executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Connection for MockConnection {
    fn executor(&mut self) -> Result<Box<dyn Executor + '_>, DbError> {
        let refused = self.executors_refused.lock().map(|r| *r).unwrap_or(false);
        if refused {
            return Err(DbError::Connect("connection is closed".to_string()));
        }
        Ok(Box::new(MockExecutor {
            scripts: Arc::clone(&self.scripts),
            log: Arc::clone(&self.log),
        }))
    }

    fn ping(&mut self) -> Result<(), DbError> {
        let refused = self.executors_refused.lock().map(|r| *r).unwrap_or(false);
        if refused {
            Err(DbError::Connect("connection is closed".to_string()))
        } else {
            Ok(())
        }
    }
}

struct MockExecutor {
    scripts: Arc<Mutex<HashMap<String, Outcome>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Executor for MockExecutor {
    fn query(&mut self, sql: &str) -> Result<ResultSet, DbError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(sql.to_string());
        }
        let scripts = self
            .scripts
            .lock()
            .map_err(|_| DbError::Sql("mock scripts poisoned".to_string()))?;
        match scripts.get(&normalize(sql)) {
            Some(Ok(rs)) => Ok(rs.clone()),
            Some(Err(msg)) => Err(DbError::Sql(msg.clone())),
            None => Ok(ResultSet::default()),
        }
    }
}

/// Whitespace-insensitive matching so scripts survive SQL reformatting.
fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
