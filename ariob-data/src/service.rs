use crate::adapter::{Adapter, Unsubscribe, WatchCallback};
use crate::subscription::SubscriptionManager;
use ariob_graph::GraphUser;
use ariob_model::{Schema, Thing, Validator};
use ariob_types::{AppError, AppResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives the current entity on every change; `None` once it is removed
/// or when the stored value no longer validates.
pub type EntityWatcher<D> = Arc<dyn Fn(Option<Thing<D>>) + Send + Sync>;

/// Typed CRUD plus watch for one schema under one prefix.
///
/// Every write is validated before it reaches the adapter and every read
/// is validated on the way back. Stored values that fail validation are
/// treated as absent.
pub struct EntityService<D> {
    validator: Validator<D>,
    adapter: Arc<dyn Adapter>,
    subscriptions: SubscriptionManager,
    identity: Option<Arc<dyn GraphUser>>,
}

impl<D> std::fmt::Debug for EntityService<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("validator", &self.validator)
            .field("adapter", &self.adapter)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

impl<D: Schema> EntityService<D> {
    pub fn new(validator: Validator<D>, adapter: Arc<dyn Adapter>) -> Self {
        Self {
            validator,
            adapter,
            subscriptions: SubscriptionManager::new(),
            identity: None,
        }
    }

    /// Stamps `createdBy` on new entities with the authenticated user.
    pub fn with_identity(mut self, identity: Arc<dyn GraphUser>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn soul(&self, id: &str) -> String {
        self.validator.soul(id)
    }

    pub fn validator(&self) -> &Validator<D> {
        &self.validator
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub async fn create(&self, data: D) -> AppResult<Thing<D>> {
        let created_by = self.identity.as_ref().and_then(|user| user.is());
        let thing = self.validator.prepare(data, created_by);
        self.store(thing).await
    }

    /// Like [`EntityService::create`] but under a caller-chosen id.
    pub async fn create_with_id(&self, id: &str, data: D) -> AppResult<Thing<D>> {
        let created_by = self.identity.as_ref().and_then(|user| user.is());
        let thing = self.validator.prepare_with_id(id, data, created_by);
        self.store(thing).await
    }

    async fn store(&self, thing: Thing<D>) -> AppResult<Thing<D>> {
        self.validator.validate(&thing)?;
        let value = serde_json::to_value(&thing)?;
        self.adapter.put(&thing.soul, value).await?;
        debug!(soul = %thing.soul, schema = D::TYPE, "entity stored");
        Ok(thing)
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Thing<D>>> {
        let soul = self.soul(id);
        let value = self.adapter.get(&soul).await?;
        Ok(value.and_then(|value| self.read_back(&soul, value)))
    }

    /// Read-merge-validate-write. Returns `None` when the entity is absent.
    ///
    /// `patch` must be a JSON object and may not touch the meta fields
    /// `id`, `soul`, `schema` or `createdAt`.
    pub async fn update(&self, id: &str, patch: Value) -> AppResult<Option<Thing<D>>> {
        let patch: Map<String, Value> = match patch {
            Value::Object(map) => map,
            _ => return Err(AppError::validation("update must be an object")),
        };
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        let merged = self.validator.merge(&current, &patch)?;
        let value = serde_json::to_value(&merged)?;
        self.adapter.put(&merged.soul, value).await?;
        debug!(soul = %merged.soul, "entity updated");
        Ok(Some(merged))
    }

    /// Writes a tombstone over the entity.
    pub async fn remove(&self, id: &str) -> AppResult<bool> {
        self.adapter.remove(&self.soul(id)).await
    }

    /// Every valid entity under the prefix; a best-effort snapshot.
    pub async fn list(&self) -> AppResult<Vec<Thing<D>>> {
        let prefix = self.validator.prefix();
        let rows = self.adapter.list(prefix).await?;
        Ok(rows
            .into_iter()
            .filter_map(|value| self.read_back(prefix, value))
            .collect())
    }

    /// Watches one entity. Watching the same id again replaces the earlier
    /// subscription; the returned closure tears down only its own.
    pub fn watch(&self, id: &str, callback: EntityWatcher<D>) -> Unsubscribe {
        let soul = self.soul(id);
        let validator = self.validator.clone();
        let path = soul.clone();
        let relay: WatchCallback = Arc::new(move |value: Option<Value>| {
            let thing = value
                .filter(|v| !v.is_null())
                .and_then(|v| match validator.check(v) {
                    Ok(thing) => Some(thing),
                    Err(err) => {
                        warn!(path = %path, error = %err, "ignoring invalid update");
                        None
                    }
                });
            callback(thing);
        });

        let teardown = self.adapter.watch(&soul, relay);
        let token = self.subscriptions.add(soul.clone(), teardown);
        let subscriptions = self.subscriptions.clone();
        Box::new(move || {
            subscriptions.remove_token(&soul, token);
        })
    }

    /// Tears down every subscription this service opened.
    pub fn cleanup(&self) {
        self.subscriptions.cleanup();
    }

    fn read_back(&self, path: &str, value: Value) -> Option<Thing<D>> {
        if value.is_null() {
            return None;
        }
        match self.validator.check(value) {
            Ok(thing) => Some(thing),
            Err(err) => {
                warn!(path, error = %err, "skipping invalid stored entity");
                None
            }
        }
    }
}

impl<D> Drop for EntityService<D> {
    fn drop(&mut self) {
        // Clones of the manager held by outstanding unsubscribe closures
        // must not keep listeners alive past the service.
        self.subscriptions.cleanup();
    }
}
