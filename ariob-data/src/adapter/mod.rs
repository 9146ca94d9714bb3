//! The uniform storage contract and its implementations.

mod graph;
mod memory;
mod scoped;

pub use graph::GraphAdapter;
pub use memory::MemoryAdapter;
pub use scoped::ScopedAdapter;

use ariob_types::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Receives the node's value on every change; `None` when absent.
pub type WatchCallback = Arc<dyn Fn(Option<Value>) + Send + Sync>;

/// Detaches a watch. Callbacks already in flight may still be delivered
/// but are ignored.
pub type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Path-addressed JSON storage.
///
/// Adapters move raw JSON; validation is the caller's concern. Deletion
/// writes a tombstone, so a removed node reads as absent.
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    async fn get(&self, path: &str) -> AppResult<Option<Value>>;

    /// Stores `value` and returns it.
    async fn put(&self, path: &str, value: Value) -> AppResult<Value>;

    async fn remove(&self, path: &str) -> AppResult<bool>;

    /// Values of the direct children of `prefix`; tombstones are skipped.
    async fn list(&self, prefix: &str) -> AppResult<Vec<Value>>;

    fn watch(&self, path: &str, callback: WatchCallback) -> Unsubscribe;
}
