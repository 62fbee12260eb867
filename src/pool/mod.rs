//! Client pool: N connections, N workers, N inbound channels.
//!
//! Every worker shares one error channel, one stats channel and one
//! shutdown signal. The shutdown signal is a `watch` channel so each worker
//! observes it independently; no worker can consume it on behalf of others.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::client::{ClientError, Connection, Connector};
use crate::config::PoolConfig;
use crate::error::{ExecError, PoolError, Result};
use crate::event::{ErrorEvent, StatsEvent};
use crate::statement::Statement;

mod worker;


use worker::{Outputs, Worker};

// ============================================================================
// Slot State
// ============================================================================

/// Lifecycle of one client slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Session is being established
    Connecting,
    /// Worker is running
    Ready,
    /// Session could not be established; the slot's channel is closed
    Failed,
    /// Worker acknowledged shutdown and released its session
    Stopped,
}

#[derive(Clone)]
struct SlotStates(Arc<Mutex<Vec<SlotState>>>);

impl SlotStates {
    fn new(n: usize, initial: SlotState) -> Self {
        Self(Arc::new(Mutex::new(vec![initial; n])))
    }

    fn set(&self, slot: usize, state: SlotState) {
        if let Some(s) = self.0.lock().get_mut(slot) {
            *s = state;
        }
    }

    fn snapshot(&self) -> Vec<SlotState> {
        self.0.lock().clone()
    }
}

/// How a slot task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotExit {
    Acknowledged,
    Failed,
}

// ============================================================================
// Statement Sender
// ============================================================================

/// Inbound channel of one worker.
#[derive(Debug, Clone)]
pub struct StatementSender {
    slot: usize,
    tx: mpsc::Sender<Statement>,
}

impl StatementSender {
    /// Index of the worker behind this channel.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Submit a statement, waiting for queue space.
    ///
    /// Fails once the slot is retired or its worker has shut down.
    pub async fn send(&self, stmt: Statement) -> Result<()> {
        self.tx
            .send(stmt)
            .await
            .map_err(|_| PoolError::SlotUnavailable { slot: self.slot })
    }

    /// Submit a statement without waiting.
    ///
    /// Returns the statement back when the queue is full.
    pub fn try_send(&self, stmt: Statement) -> std::result::Result<(), TrySendError> {
        self.tx.try_send(stmt).map_err(|e| match e {
            mpsc::error::TrySendError::Full(stmt) => TrySendError::Full(stmt),
            mpsc::error::TrySendError::Closed(stmt) => TrySendError::Unavailable {
                slot: self.slot,
                stmt,
            },
        })
    }

    /// Whether the worker side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Rejection from [`StatementSender::try_send`].
#[derive(Debug, thiserror::Error)]
pub enum TrySendError {
    #[error("Client queue is full")]
    Full(Statement),

    #[error("Client {slot} is unavailable")]
    Unavailable { slot: usize, stmt: Statement },
}

// ============================================================================
// Client Pool
// ============================================================================

/// Completion summary returned by [`ClientPool::join`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Workers that acknowledged shutdown
    pub acknowledged: usize,
    /// Slots that never connected
    pub failed: Vec<usize>,
}

/// A running pool of workers.
pub struct ClientPool {
    senders: Vec<StatementSender>,
    handle: PoolHandle,
}

impl ClientPool {
    fn new(senders: Vec<StatementSender>, handles: Vec<JoinHandle<SlotExit>>, states: SlotStates) -> Self {
        Self {
            senders,
            handle: PoolHandle { handles, states },
        }
    }

    /// Number of slots (always the configured concurrency).
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Inbound channels, ordered by slot index.
    pub fn senders(&self) -> &[StatementSender] {
        &self.senders
    }

    /// Inbound channel of one slot.
    pub fn sender(&self, slot: usize) -> Option<&StatementSender> {
        self.senders.get(slot)
    }

    /// Hand the inbound channels to the caller, keeping the lifecycle handle.
    pub fn into_senders(self) -> (Vec<StatementSender>, PoolHandle) {
        (self.senders, self.handle)
    }

    /// Current state of every slot.
    pub fn slot_states(&self) -> Vec<SlotState> {
        self.handle.slot_states()
    }

    /// Slots whose worker is running.
    pub fn live_slots(&self) -> Vec<usize> {
        self.handle.live_slots()
    }

    /// Wait for every slot task to finish; see [`PoolHandle::join`].
    ///
    /// Drops this pool's senders first.
    pub async fn join(self) -> Result<PoolReport> {
        drop(self.senders);
        self.handle.join().await
    }
}

/// Worker tasks and slot states of a pool whose senders were handed out.
pub struct PoolHandle {
    handles: Vec<JoinHandle<SlotExit>>,
    states: SlotStates,
}

impl PoolHandle {
    /// Current state of every slot.
    pub fn slot_states(&self) -> Vec<SlotState> {
        self.states.snapshot()
    }

    /// Slots whose worker is running.
    pub fn live_slots(&self) -> Vec<usize> {
        self.states
            .snapshot()
            .into_iter()
            .enumerate()
            .filter(|(_, s)| *s == SlotState::Ready)
            .map(|(i, _)| i)
            .collect()
    }

    /// Wait for every slot task to finish.
    ///
    /// Workers only exit on shutdown, so this waits until the shutdown
    /// signal has been sent.
    pub async fn join(self) -> Result<PoolReport> {
        let mut report = PoolReport::default();
        for (slot, handle) in self.handles.into_iter().enumerate() {
            match handle.await? {
                SlotExit::Acknowledged => report.acknowledged += 1,
                SlotExit::Failed => report.failed.push(slot),
            }
        }
        Ok(report)
    }
}

// ============================================================================
// Pool Manager
// ============================================================================

/// Creates and wires the workers of a [`ClientPool`].
pub struct ClientPoolManager {
    config: Arc<PoolConfig>,
    outputs: Outputs,
    shutdown: watch::Receiver<bool>,
}

impl ClientPoolManager {
    /// Bind a configuration to the shared channels.
    ///
    /// Sending `true` on the shutdown channel (or dropping its sender) stops
    /// every worker.
    pub fn new(
        config: PoolConfig,
        errors: mpsc::Sender<ErrorEvent>,
        stats: mpsc::Sender<StatsEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            outputs: Outputs { errors, stats },
            shutdown,
        })
    }

    /// Launch `concurrency` workers and return immediately.
    ///
    /// Each slot connects in its own task. A slot that fails to connect is
    /// retired: its channel is closed, statements already queued on it are
    /// answered with [`ExecError::SlotUnavailable`], and later submissions
    /// fail with [`PoolError::SlotUnavailable`].
    ///
    /// Must be called within a Tokio runtime.
    pub fn start<C: Connector>(&self, connector: Arc<C>) -> ClientPool {
        let n = self.config.concurrency;
        let states = SlotStates::new(n, SlotState::Connecting);
        let mut senders = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);

        for slot in 0..n {
            let (sender, rx) = self.channel(slot);
            senders.push(sender);

            let connector = Arc::clone(&connector);
            let config = Arc::clone(&self.config);
            let outputs = self.outputs.clone();
            let shutdown = self.shutdown.clone();
            let states = states.clone();

            handles.push(tokio::spawn(async move {
                let conn = match connector
                    .connect(&config.address, &config.user, &config.password)
                    .await
                {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(slot, address = %config.address, error = %e, "failed to connect client, retiring slot");
                        states.set(slot, SlotState::Failed);
                        retire(slot, rx, &outputs, &e).await;
                        return SlotExit::Failed;
                    }
                };

                states.set(slot, SlotState::Ready);
                Worker::new(slot, conn, rx, outputs, shutdown, config.retry_policy())
                    .run()
                    .await;
                states.set(slot, SlotState::Stopped);
                SlotExit::Acknowledged
            }));
        }

        info!("Create {} clients for {}", n, self.config.address);
        ClientPool::new(senders, handles, states)
    }

    /// Connect every slot first, then launch the workers.
    ///
    /// All-or-nothing: if any connection fails, the sessions already
    /// established are closed and no worker is started.
    pub async fn start_strict<C: Connector>(&self, connector: Arc<C>) -> Result<ClientPool> {
        let n = self.config.concurrency;
        let mut conns = Vec::with_capacity(n);

        for slot in 0..n {
            match connector
                .connect(&self.config.address, &self.config.user, &self.config.password)
                .await
            {
                Ok(conn) => conns.push(conn),
                Err(source) => {
                    error!(slot, address = %self.config.address, error = %source, "failed to connect client, aborting pool");
                    for conn in conns {
                        conn.disconnect().await;
                    }
                    return Err(PoolError::Connect { slot, source });
                }
            }
        }

        let states = SlotStates::new(n, SlotState::Ready);
        let mut senders = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);

        for (slot, conn) in conns.into_iter().enumerate() {
            let (sender, rx) = self.channel(slot);
            senders.push(sender);

            let worker = Worker::new(
                slot,
                conn,
                rx,
                self.outputs.clone(),
                self.shutdown.clone(),
                self.config.retry_policy(),
            );
            let states = states.clone();
            handles.push(tokio::spawn(async move {
                worker.run().await;
                states.set(slot, SlotState::Stopped);
                SlotExit::Acknowledged
            }));
        }

        info!("Create {} clients for {}", n, self.config.address);
        Ok(ClientPool::new(senders, handles, states))
    }

    fn channel(&self, slot: usize) -> (StatementSender, mpsc::Receiver<Statement>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        (StatementSender { slot, tx }, rx)
    }
}

/// Close a dead slot's queue and answer whatever was already accepted.
async fn retire(
    slot: usize,
    mut rx: mpsc::Receiver<Statement>,
    outputs: &Outputs,
    cause: &ClientError,
) {
    rx.close();
    while let Some(stmt) = rx.recv().await {
        let error = ExecError::SlotUnavailable {
            slot,
            cause: cause.to_string(),
        };
        outputs.error(slot, error, stmt.values).await;
    }
}
