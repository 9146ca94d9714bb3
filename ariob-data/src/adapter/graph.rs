use super::{Adapter, Unsubscribe, WatchCallback};
use crate::ack::{await_ack, await_read, collect_rows};
use crate::config::AdapterConfig;
use ariob_graph::{GraphStore, Listener};
use ariob_types::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Adapter over the shared graph.
#[derive(Debug, Clone)]
pub struct GraphAdapter {
    graph: Arc<dyn GraphStore>,
    config: AdapterConfig,
}

impl GraphAdapter {
    pub fn new(graph: Arc<dyn GraphStore>, config: AdapterConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

#[async_trait]
impl Adapter for GraphAdapter {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        await_read(self.graph.once(path), self.config.ack_timeout(), path).await
    }

    async fn put(&self, path: &str, value: Value) -> AppResult<Value> {
        let rx = self.graph.put(path, value.clone());
        await_ack(rx, self.config.ack_timeout(), path).await?;
        Ok(value)
    }

    async fn remove(&self, path: &str) -> AppResult<bool> {
        let rx = self.graph.put(path, Value::Null);
        await_ack(rx, self.config.ack_timeout(), path).await?;
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<Value>> {
        let rows = collect_rows(self.graph.map(prefix), self.config.settle_window()).await;
        debug!(prefix, rows = rows.len(), "listing settled");
        Ok(rows
            .into_iter()
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
            .collect())
    }

    fn watch(&self, path: &str, callback: WatchCallback) -> Unsubscribe {
        let live = Arc::new(AtomicBool::new(true));
        let gate = Arc::clone(&live);
        let listener: Listener = Arc::new(move |value| {
            if gate.load(Ordering::Acquire) {
                callback(value);
            }
        });

        let id = self.graph.on(path, listener);
        let graph = Arc::clone(&self.graph);
        Box::new(move || {
            live.store(false, Ordering::Release);
            graph.off(id);
        })
    }
}
