use super::{Adapter, Unsubscribe, WatchCallback};
use ariob_types::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<String, Value>,
    watchers: HashMap<u64, (String, WatchCallback)>,
    next_watcher: u64,
}

/// In-process adapter.
///
/// Operations complete immediately and watchers are called synchronously,
/// after the write is applied and outside any lock.
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<Mutex<MemoryState>>,
}

impl std::fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryAdapter")
            .field("nodes", &state.nodes.len())
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Writes raw JSON without notifying watchers.
    pub fn insert_raw(&self, path: impl Into<String>, value: Value) {
        self.lock().nodes.insert(path.into(), value);
    }

    pub fn watcher_count(&self) -> usize {
        self.lock().watchers.len()
    }

    fn notify(&self, path: &str, value: Option<Value>) {
        let callbacks: Vec<WatchCallback> = self
            .lock()
            .watchers
            .values()
            .filter(|(p, _)| p == path)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(value.clone());
        }
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        Ok(self.lock().nodes.get(path).cloned())
    }

    async fn put(&self, path: &str, value: Value) -> AppResult<Value> {
        self.lock().nodes.insert(path.to_string(), value.clone());
        self.notify(path, Some(value.clone()));
        Ok(value)
    }

    async fn remove(&self, path: &str) -> AppResult<bool> {
        let existed = self.lock().nodes.remove(path).is_some();
        if existed {
            self.notify(path, None);
        }
        Ok(existed)
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<Value>> {
        let start = format!("{prefix}/");
        let state = self.lock();
        Ok(state
            .nodes
            .range(start.clone()..)
            .take_while(|(k, _)| k.starts_with(&start))
            .filter(|(k, _)| !k[start.len()..].contains('/'))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn watch(&self, path: &str, callback: WatchCallback) -> Unsubscribe {
        let (id, current) = {
            let mut state = self.lock();
            let id = state.next_watcher;
            state.next_watcher += 1;
            state
                .watchers
                .insert(id, (path.to_string(), Arc::clone(&callback)));
            (id, state.nodes.get(path).cloned())
        };
        if let Some(value) = current {
            callback(Some(value));
        }

        let state = Arc::clone(&self.state);
        Box::new(move || {
            state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .watchers
                .remove(&id);
        })
    }
}
