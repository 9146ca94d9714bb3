use crate::adapter::Unsubscribe;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Default)]
struct Registry {
    live: HashMap<String, (u64, Unsubscribe)>,
}

/// Live watch subscriptions, at most one per key.
///
/// Cloning shares the same registry. Teardowns always run outside the
/// lock, so a teardown may call back into the manager.
#[derive(Clone, Default)]
pub struct SubscriptionManager {
    registry: Arc<Mutex<Registry>>,
    next_token: Arc<AtomicU64>,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("size", &self.size())
            .finish()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `teardown` under `key`, tearing down whatever was there.
    ///
    /// Returns a token identifying this registration for
    /// [`SubscriptionManager::remove_token`].
    pub fn add(&self, key: impl Into<String>, teardown: Unsubscribe) -> u64 {
        let key = key.into();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let previous = self.lock().live.insert(key.clone(), (token, teardown));
        if let Some((_, old)) = previous {
            trace!(key, "replacing subscription");
            old();
        }
        token
    }

    /// Tears down the subscription under `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.lock().live.remove(key);
        match removed {
            Some((_, teardown)) => {
                teardown();
                true
            }
            None => false,
        }
    }

    /// Tears down `key` only if it still holds the registration `token`.
    pub fn remove_token(&self, key: &str, token: u64) -> bool {
        let removed = {
            let mut registry = self.lock();
            match registry.live.get(key) {
                Some((current, _)) if *current == token => registry.live.remove(key),
                _ => None,
            }
        };
        match removed {
            Some((_, teardown)) => {
                teardown();
                true
            }
            None => false,
        }
    }

    /// Tears down every subscription.
    pub fn cleanup(&self) {
        let drained: Vec<_> = self.lock().live.drain().collect();
        trace!(count = drained.len(), "cleaning up subscriptions");
        for (_, (_, teardown)) in drained {
            teardown();
        }
    }

    pub fn size(&self) -> usize {
        self.lock().live.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().live.contains_key(key)
    }
}
