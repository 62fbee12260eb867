//! Worker loop: one connection, one inbound queue, serial execution.

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::Connection;
use crate::error::ExecError;
use crate::event::{ErrorEvent, StatsEvent};
use crate::retry::RetryPolicy;
use crate::statement::{Statement, Value};

/// Shared output side every worker writes to.
#[derive(Clone)]
pub(crate) struct Outputs {
    pub errors: mpsc::Sender<ErrorEvent>,
    pub stats: mpsc::Sender<StatsEvent>,
}

impl Outputs {
    pub async fn error(&self, worker: usize, error: ExecError, data: Vec<Value>) {
        let event = ErrorEvent::Failed { worker, error, data };
        if self.errors.send(event).await.is_err() {
            warn!(worker, "error channel closed, dropping failure event");
        }
    }

    pub async fn done(&self, worker: usize) {
        if self.errors.send(ErrorEvent::Done { worker }).await.is_err() {
            warn!(worker, "error channel closed, dropping shutdown acknowledgment");
        }
    }

    pub async fn stats(&self, worker: usize, stats: StatsEvent) {
        if self.stats.send(stats).await.is_err() {
            warn!(worker, "stats channel closed, dropping stats event");
        }
    }
}

/// Resolves once shutdown is requested. A dropped sender counts as shutdown.
pub(crate) async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    let _ = signal.wait_for(|stop| *stop).await;
}

enum Next {
    Shutdown,
    Statement(Statement),
    InboundClosed,
}

pub(crate) struct Worker<C: Connection> {
    id: usize,
    conn: C,
    statements: mpsc::Receiver<Statement>,
    outputs: Outputs,
    shutdown: watch::Receiver<bool>,
    retry: RetryPolicy,
}

impl<C: Connection> Worker<C> {
    pub fn new(
        id: usize,
        conn: C,
        statements: mpsc::Receiver<Statement>,
        outputs: Outputs,
        shutdown: watch::Receiver<bool>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            conn,
            statements,
            outputs,
            shutdown,
            retry,
        }
    }

    /// Run until shutdown, then acknowledge and release the connection.
    pub async fn run(mut self) {
        let mut inbound_open = true;

        loop {
            // Shutdown wins over a queued statement.
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => Next::Shutdown,
                stmt = self.statements.recv(), if inbound_open => match stmt {
                    Some(stmt) => Next::Statement(stmt),
                    None => Next::InboundClosed,
                },
            };

            match next {
                Next::Shutdown => break,
                Next::Statement(stmt) => self.dispatch(stmt).await,
                Next::InboundClosed => {
                    debug!(worker = self.id, "inbound channel closed, waiting for shutdown");
                    inbound_open = false;
                }
            }
        }

        debug!(worker = self.id, "shutting down");
        self.outputs.done(self.id).await;
        self.conn.disconnect().await;
    }

    /// Execute one statement and emit exactly one event for it.
    async fn dispatch(&mut self, stmt: Statement) {
        if let Some(placeholders) = self.conn.placeholders(&stmt) {
            if placeholders != stmt.values.len() {
                let error = ExecError::Arity {
                    statement: stmt.text.clone(),
                    placeholders,
                    values: stmt.values.len(),
                };
                self.outputs.error(self.id, error, stmt.values).await;
                return;
            }
        }

        match self.execute(&stmt).await {
            Ok(stats) => self.outputs.stats(self.id, stats).await,
            Err(error) => self.outputs.error(self.id, error, stmt.values).await,
        }
    }

    /// Execute with the retry budget and classify the final outcome.
    ///
    /// Only transport failures are retried. A shutdown during backoff gives
    /// up and returns the last failure.
    async fn execute(&mut self, stmt: &Statement) -> Result<StatsEvent, ExecError> {
        let mut attempt = 0;

        loop {
            let started = Instant::now();
            let result = self.conn.execute(stmt).await;
            let req_time = started.elapsed().as_secs_f64();

            let err = match result {
                Ok(resp) if resp.is_success() => {
                    return Ok(StatsEvent {
                        latency: resp.latency_us,
                        req_time,
                    });
                }
                Ok(resp) => {
                    return Err(ExecError::Store {
                        statement: stmt.render(),
                        message: resp.message,
                        code: resp.code,
                    });
                }
                Err(err) => err,
            };

            if !self.retry.should_retry(attempt) {
                return Err(err.into());
            }

            let delay = self.retry.backoff(attempt);
            debug!(worker = self.id, attempt, ?delay, error = %err, "retrying statement");

            let interrupted = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if interrupted {
                return Err(err.into());
            }
            attempt += 1;
        }
    }
}
