use crate::error::GraphResult;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Outcome carried by a write acknowledgment.
pub type Ack = GraphResult<()>;

/// One child delivered by [`GraphStore::map`]: `(key, value)`.
///
/// A `Value::Null` value is a tombstone.
pub type Row = (String, Value);

/// Change callback. Receives `None` when the node is absent or tombstoned.
pub type Listener = Arc<dyn Fn(Option<Value>) + Send + Sync>;

/// Handle for detaching a listener registered with [`GraphStore::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// `parent/key`.
pub fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}/{key}")
}

/// The backing graph store.
///
/// Eventually consistent, last-write-wins, no multi-node transactions and
/// no hard completion signal: an acknowledgment may never arrive, and a
/// `map` stream may stay open indefinitely. Writing `Value::Null` is the
/// only way to delete.
pub trait GraphStore: Send + Sync + std::fmt::Debug {
    /// Writes `value` at `path`. The receiver resolves when (if) a peer
    /// acknowledges; a dropped sender means no acknowledgment will come.
    fn put(&self, path: &str, value: Value) -> oneshot::Receiver<Ack>;

    /// Reads the current value at `path` once.
    fn once(&self, path: &str) -> oneshot::Receiver<Option<Value>>;

    /// Streams the direct children of `path` as they arrive.
    fn map(&self, path: &str) -> mpsc::UnboundedReceiver<Row>;

    /// Calls `listener` with the current value and on every later change.
    fn on(&self, path: &str, listener: Listener) -> ListenerId;

    /// Detaches a listener; unknown ids are ignored.
    fn off(&self, id: ListenerId);
}
