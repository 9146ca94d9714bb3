//! Bounded waits on graph callbacks.

use ariob_graph::{Ack, GraphError, Row};
use ariob_types::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Resolves a write: an error acknowledgment fails it, anything else
/// (success, silence past `limit`, a vanished sender) succeeds.
///
/// Exactly one outcome is produced; an acknowledgment arriving after the
/// timeout is dropped with the receiver.
pub(crate) async fn await_ack(
    rx: oneshot::Receiver<Ack>,
    limit: Duration,
    path: &str,
) -> AppResult<()> {
    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(Ok(()))) => {
            debug!(path, "write acknowledged");
            Ok(())
        }
        Ok(Ok(Err(err))) => Err(ack_error(err)),
        Ok(Err(_)) => {
            warn!(path, "write acknowledgment channel closed; assuming success");
            Ok(())
        }
        Err(_) => {
            warn!(path, timeout_ms = limit.as_millis() as u64, "no write acknowledgment; assuming success");
            Ok(())
        }
    }
}

fn ack_error(err: GraphError) -> AppError {
    match err {
        GraphError::Rejected(reason) => {
            AppError::storage("failed to save").with_cause(reason)
        }
        other => other.into(),
    }
}

/// Reads a single node, bounded by `limit`.
pub(crate) async fn await_read(
    rx: oneshot::Receiver<Option<Value>>,
    limit: Duration,
    path: &str,
) -> AppResult<Option<Value>> {
    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(GraphError::ChannelClosed.into()),
        Err(_) => {
            warn!(path, "read timed out");
            Err(GraphError::Timeout.into())
        }
    }
}

/// Collects rows until the stream ends or `window` elapses, whichever
/// comes first.
pub(crate) async fn collect_rows(mut rx: mpsc::UnboundedReceiver<Row>, window: Duration) -> Vec<Row> {
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);
    let mut rows = Vec::new();
    loop {
        tokio::select! {
            row = rx.recv() => match row {
                Some(row) => rows.push(row),
                None => break,
            },
            _ = &mut deadline => break,
        }
    }
    rows
}
