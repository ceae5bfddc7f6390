//! ODBC-backed driver. Altibase ships an ODBC driver as its supported C
//! client, so the production connection goes through `odbc-api`.
//!
//! Every column is fetched as text; [`super::Value`] does the numeric
//! conversion on access. This keeps the driver oblivious to the catalog's
//! column types, which drift across server versions anyway.

use super::{Connection, DbError, Executor, ResultSet, Value};
use odbc_api::{ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretString};

static ENV: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment, DbError> {
    ENV.get_or_try_init(|| Environment::new().map_err(|e| DbError::Connect(e.to_string())))
}

pub struct OdbcConnection {
    conn: odbc_api::Connection<'static>,
}

impl OdbcConnection {
    /// Opens a connection with a DSN-less connection string built from the
    /// discrete config fields.
    pub fn connect(
        server: &str,
        port: u16,
        user: &str,
        password: &SecretString,
        database: &str,
    ) -> Result<Self, DbError> {
        let env = environment()?;
        let conn_str = format!(
            "DRIVER={{Altibase}};SERVER={server};PORT={port};USER={user};PASSWORD={password};NLS_USE=UTF8;DATABASE={database}",
            password = password.expose_secret(),
        );
        let conn = env
            .connect_with_connection_string(&conn_str, ConnectionOptions::default())
            .map_err(|e| DbError::Connect(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl Connection for OdbcConnection {
    fn executor(&mut self) -> Result<Box<dyn Executor + '_>, DbError> {
        Ok(Box::new(OdbcExecutor { conn: &self.conn }))
    }

    fn ping(&mut self) -> Result<(), DbError> {
        let mut exec = OdbcExecutor { conn: &self.conn };
        exec.query("SELECT 1 FROM DUAL").map(|_| ())
    }
}

struct OdbcExecutor<'c> {
    conn: &'c odbc_api::Connection<'static>,
}

impl Executor for OdbcExecutor<'_> {
    fn query(&mut self, sql: &str) -> Result<ResultSet, DbError> {
        let cursor = self
            .conn
            .execute(sql, ())
            .map_err(|e| DbError::Sql(e.to_string()))?;

        let Some(mut cursor) = cursor else {
            return Ok(ResultSet::default());
        };

        let col_count = cursor
            .num_result_cols()
            .map_err(|e| DbError::Sql(e.to_string()))? as u16;

        let mut columns = Vec::with_capacity(col_count as usize);
        for i in 1..=col_count {
            let name = cursor
                .col_name(i)
                .map_err(|e| DbError::Sql(e.to_string()))?;
            columns.push(name);
        }

        let mut rows = Vec::new();
        let mut buf = Vec::new();
        while let Some(mut row) = cursor.next_row().map_err(|e| DbError::Sql(e.to_string()))? {
            let mut values = Vec::with_capacity(col_count as usize);
            for i in 1..=col_count {
                buf.clear();
                let present = row
                    .get_text(i, &mut buf)
                    .map_err(|e| DbError::Sql(e.to_string()))?;
                if present {
                    values.push(Value::Text(String::from_utf8_lossy(&buf).into_owned()));
                } else {
                    values.push(Value::Null);
                }
            }
            rows.push(values);
        }

        Ok(ResultSet::new(columns, rows))
    }
}
