//! Telemetry events emitted by workers.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::error::ExecError;
use crate::statement::Value;

/// Outcome on the shared error channel.
///
/// Serializes flat as `{worker, error, data, done}`: `error` is the cause
/// text (null for `Done`), `data` the failed statement's values.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEvent {
    /// A statement failed; the worker carries on.
    Failed {
        worker: usize,
        error: ExecError,
        data: Vec<Value>,
    },
    /// The worker observed shutdown and exited. Emitted exactly once per
    /// running worker; carries no statement context.
    Done { worker: usize },
}

impl ErrorEvent {
    /// Whether this is a shutdown acknowledgment.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, ErrorEvent::Done { .. })
    }

    /// Index of the worker that produced the event.
    pub fn worker(&self) -> usize {
        match self {
            ErrorEvent::Failed { worker, .. } | ErrorEvent::Done { worker } => *worker,
        }
    }

    /// The failure cause, if any.
    pub fn error(&self) -> Option<&ExecError> {
        match self {
            ErrorEvent::Failed { error, .. } => Some(error),
            ErrorEvent::Done { .. } => None,
        }
    }

    /// Values of the failed statement; empty for `Done`.
    pub fn data(&self) -> &[Value] {
        match self {
            ErrorEvent::Failed { data, .. } => data,
            ErrorEvent::Done { .. } => &[],
        }
    }
}

impl Serialize for ErrorEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut event = serializer.serialize_struct("ErrorEvent", 4)?;
        event.serialize_field("worker", &self.worker())?;
        event.serialize_field("error", &self.error().map(ToString::to_string))?;
        event.serialize_field("data", self.data())?;
        event.serialize_field("done", &self.is_done())?;
        event.end()
    }
}

/// Outcome on the shared stats channel; one per successful statement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEvent {
    /// Latency reported by the store, in microseconds
    pub latency: u64,
    /// Measured round trip, in seconds
    pub req_time: f64,
}
