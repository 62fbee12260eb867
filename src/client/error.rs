//! Connection-layer error types.

use thiserror::Error;

/// Result type for store client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by a store session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Could not reach the store.
    #[error("Dial failed: {0}")]
    Dial(String),

    /// The store rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The call failed in transit.
    #[error("{0}")]
    Transport(String),

    /// The session was already closed.
    #[error("Connection is closed")]
    Closed,
}

impl From<tokio_rusqlite::Error> for ClientError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        match e {
            tokio_rusqlite::Error::ConnectionClosed => ClientError::Closed,
            other => ClientError::Transport(other.to_string()),
        }
    }
}
