//! SQLite store client.
//!
//! Each session is a `tokio_rusqlite` connection with its own background
//! thread. Values are bound positionally, so the template text is sent to
//! the engine untouched.

use std::time::Instant;

use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use super::error::{ClientError, ClientResult};
use super::types::value_from_ref;
use super::{Connection as StoreConnection, Connector, Response};
use crate::statement::{Statement, Value};

const MEMORY: &str = ":memory:";

/// Opens [`SqliteClient`] sessions.
///
/// SQLite has no authentication; credentials are accepted and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    type Conn = SqliteClient;

    async fn connect(&self, address: &str, _user: &str, _password: &str) -> ClientResult<SqliteClient> {
        SqliteClient::open(address).await
    }
}

/// A SQLite session.
pub struct SqliteClient {
    conn: Option<Connection>,
    path: String,
}

impl SqliteClient {
    /// Open a database.
    ///
    /// Supports:
    /// - `:memory:` for a private in-memory database
    /// - a file path, opened in WAL mode with a busy timeout so several
    ///   sessions can write to the same file
    pub async fn open(path: &str) -> ClientResult<Self> {
        let is_memory = path == MEMORY;
        let conn = if is_memory {
            Connection::open_in_memory().await
        } else {
            Connection::open(path).await
        }
        .map_err(|e| ClientError::Dial(format!("{}: {}", path, e)))?;

        if !is_memory {
            conn.call(|c| {
                c.execute_batch(
                    "PRAGMA journal_mode=WAL;
                     PRAGMA synchronous=NORMAL;
                     PRAGMA busy_timeout=5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(|e| ClientError::Dial(format!("{}: {}", path, e)))?;
        }

        debug!(path, "opened sqlite session");
        Ok(Self {
            conn: Some(conn),
            path: path.to_string(),
        })
    }

    /// Run a query and collect every row, for reading results back.
    pub async fn query(&self, sql: &str) -> ClientResult<Vec<Vec<Value>>> {
        let conn = self.conn.as_ref().ok_or(ClientError::Closed)?;
        let sql = sql.to_string();

        let rows = conn
            .call(move |c| {
                let mut stmt = c.prepare_cached(&sql)?;
                let width = stmt.column_count();
                let mut rows = stmt.query([])?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(width);
                    for i in 0..width {
                        values.push(value_from_ref(row.get_ref(i)?));
                    }
                    out.push(values);
                }
                Ok(out)
            })
            .await?;
        Ok(rows)
    }

    /// Check if the session is closed.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl StoreConnection for SqliteClient {
    /// SQLite counts parameters when preparing; `?` inside literals is not one.
    fn placeholders(&self, _stmt: &Statement) -> Option<usize> {
        None
    }

    async fn execute(&mut self, stmt: &Statement) -> ClientResult<Response> {
        let conn = self.conn.as_ref().ok_or(ClientError::Closed)?;
        let sql = stmt.text.clone();
        let params = stmt.values.clone();

        let response = conn
            .call(move |c| {
                let started = Instant::now();
                let outcome = run_statement(c, &sql, &params);
                let latency_us = started.elapsed().as_micros() as u64;
                Ok(match outcome {
                    Ok(()) => Response::succeeded(latency_us),
                    Err(e) => failure_response(&e, latency_us),
                })
            })
            .await?;
        Ok(response)
    }

    async fn disconnect(mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                warn!(path = %self.path, error = %e, "failed to close sqlite session");
            }
        }
    }
}

/// Prepare, check arity, bind and step through every row.
fn run_statement(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;
    let expected = stmt.parameter_count();
    if expected != params.len() {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_RANGE),
            Some(format!(
                "statement expects {} values, got {}",
                expected,
                params.len()
            )),
        ));
    }
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while rows.next()?.is_some() {}
    Ok(())
}

/// Engine errors become non-success responses carrying the extended result code.
fn failure_response(err: &rusqlite::Error, latency_us: u64) -> Response {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            Response::failed(failure.extended_code, message.clone(), latency_us)
        }
        rusqlite::Error::SqliteFailure(failure, None) => {
            Response::failed(failure.extended_code, failure.to_string(), latency_us)
        }
        other => Response::failed(rusqlite::ffi::SQLITE_ERROR, other.to_string(), latency_us),
    }
}
