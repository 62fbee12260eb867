//! bulkpool - a bounded worker pool for bulk statement import.
//!
//! A [`ClientPoolManager`] opens one store session per worker and hands back
//! one inbound channel per worker. Every statement submitted produces exactly
//! one event: an [`ErrorEvent`] on the shared error channel or a
//! [`StatsEvent`] on the shared stats channel. Sending `true` on the shared
//! `watch` shutdown channel makes every worker acknowledge with
//! [`ErrorEvent::Done`] and release its session.
//!
//! ```rust,ignore
//! let (err_tx, err_rx) = tokio::sync::mpsc::channel(1024);
//! let (stats_tx, stats_rx) = tokio::sync::mpsc::channel(1024);
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let config = PoolConfig::new("import.db").concurrency(4).retry(2);
//! let manager = ClientPoolManager::new(config, err_tx, stats_tx, shutdown_rx)?;
//! let pool = manager.start(Arc::new(SqliteConnector));
//!
//! pool.senders()[0]
//!     .send(Statement::new("INSERT INTO t VALUES (?, ?)", vec![1.into(), "a".into()]))
//!     .await?;
//!
//! shutdown_tx.send(true)?;
//! let report = pool.join().await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod pool;
pub mod retry;
pub mod statement;

pub use client::{ClientError, Connection, Connector, Response, SqliteClient, SqliteConnector};
pub use config::PoolConfig;
pub use error::{ExecError, PoolError, Result};
pub use event::{ErrorEvent, StatsEvent};
pub use pool::{ClientPool, ClientPoolManager, PoolHandle, PoolReport, SlotState, StatementSender, TrySendError};
pub use retry::RetryPolicy;
pub use statement::{Statement, Value};
