//! Store clients.
//!
//! A worker owns exactly one [`Connection`] for its whole life. The pool
//! only needs two things from a store:
//! - [`Connector::connect`]: dial and authenticate one session
//! - [`Connection::execute`]: run one statement and report its status
//!
//! Architecture:
//! - `error`: connection-layer errors
//! - `types`: binding [`crate::Value`] to SQLite parameters
//! - `sqlite`: a store backed by rusqlite, one background thread per session

use std::future::Future;

pub mod error;
pub mod sqlite;
pub mod types;


pub use error::{ClientError, ClientResult};
pub use sqlite::{SqliteClient, SqliteConnector};

use crate::statement::Statement;

/// Store answer to one executed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code; [`Response::SUCCEEDED`] on success
    pub code: i32,
    /// Error message from the store (empty on success)
    pub message: String,
    /// Time the store spent on the statement, in microseconds
    pub latency_us: u64,
}

impl Response {
    pub const SUCCEEDED: i32 = 0;

    pub fn succeeded(latency_us: u64) -> Self {
        Self {
            code: Self::SUCCEEDED,
            message: String::new(),
            latency_us,
        }
    }

    pub fn failed(code: i32, message: impl Into<String>, latency_us: u64) -> Self {
        Self {
            code,
            message: message.into(),
            latency_us,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCEEDED
    }
}

/// One authenticated session, used by a single worker.
pub trait Connection: Send + 'static {
    /// Placeholders the worker must see matched by values before executing.
    ///
    /// The default counts `?` in the raw text, which suits stores that take
    /// rendered text. A store that parses statements itself returns `None`
    /// and reports a mismatch as a non-success [`Response`].
    fn placeholders(&self, stmt: &Statement) -> Option<usize> {
        Some(stmt.placeholder_count())
    }

    /// Execute one statement.
    ///
    /// `Err` means the call itself failed; a store-side failure is an `Ok`
    /// response with a non-success code.
    fn execute(&mut self, stmt: &Statement)
        -> impl Future<Output = ClientResult<Response>> + Send;

    /// Close the session.
    fn disconnect(self) -> impl Future<Output = ()> + Send;
}

/// Factory for sessions, shared by every slot of a pool.
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    /// Dial `address` and authenticate.
    fn connect(
        &self,
        address: &str,
        user: &str,
        password: &str,
    ) -> impl Future<Output = ClientResult<Self::Conn>> + Send;
}
