//! Error types for the statement pool.
//!
//! Connection-layer failures live in [`crate::client::ClientError`]; the
//! per-statement cause carried by a failure event is [`ExecError`].

use thiserror::Error;

use crate::client::ClientError;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect client {slot}: {source}")]
    Connect {
        slot: usize,
        #[source]
        source: ClientError,
    },

    #[error("Client {slot} is unavailable")]
    SlotUnavailable { slot: usize },

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// Why a single statement failed.
///
/// `Display` yields the cause text a telemetry sink records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    /// The call itself failed before the store answered.
    #[error("{0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("Fail to execute: {statement}, ErrMsg: {message}, ErrCode: {code}")]
    Store {
        statement: String,
        message: String,
        code: i32,
    },

    /// Placeholder count and value count disagree; the statement was not sent.
    #[error("Statement has {placeholders} placeholders but {values} values: {statement}")]
    Arity {
        statement: String,
        placeholders: usize,
        values: usize,
    },

    /// The statement was accepted by a client slot that never connected.
    #[error("Client {slot} is unavailable: {cause}")]
    SlotUnavailable { slot: usize, cause: String },
}

impl From<ClientError> for ExecError {
    fn from(err: ClientError) -> Self {
        ExecError::Transport(err.to_string())
    }
}
