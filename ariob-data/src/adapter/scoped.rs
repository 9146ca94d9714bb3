use super::{Adapter, GraphAdapter, Unsubscribe, WatchCallback};
use ariob_graph::GraphUser;
use ariob_types::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Adapter confined to the authenticated user's region of the graph.
///
/// Every path is rewritten to `~<pub>/<path>`, resolved per call, so the
/// adapter follows account switches. Without an authenticated user every
/// operation fails with an auth error.
#[derive(Debug, Clone)]
pub struct ScopedAdapter {
    inner: GraphAdapter,
    user: Arc<dyn GraphUser>,
}

impl ScopedAdapter {
    pub fn new(inner: GraphAdapter, user: Arc<dyn GraphUser>) -> Self {
        Self { inner, user }
    }

    /// The graph path `path` maps to for the current user.
    pub fn scope(&self, path: &str) -> AppResult<String> {
        let public = self
            .user
            .is()
            .ok_or_else(|| AppError::auth("not authenticated"))?;
        Ok(format!("~{public}/{path}"))
    }
}

#[async_trait]
impl Adapter for ScopedAdapter {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        self.inner.get(&self.scope(path)?).await
    }

    async fn put(&self, path: &str, value: Value) -> AppResult<Value> {
        self.inner.put(&self.scope(path)?, value).await
    }

    async fn remove(&self, path: &str) -> AppResult<bool> {
        self.inner.remove(&self.scope(path)?).await
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<Value>> {
        self.inner.list(&self.scope(prefix)?).await
    }

    fn watch(&self, path: &str, callback: WatchCallback) -> Unsubscribe {
        match self.scope(path) {
            Ok(scoped) => self.inner.watch(&scoped, callback),
            Err(_) => {
                warn!(path, "watch requested without an authenticated user");
                Box::new(|| {})
            }
        }
    }
}
