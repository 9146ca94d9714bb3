//! In-process graph store and user system.

use crate::error::{GraphError, GraphResult};
use crate::store::{Ack, GraphStore, Listener, ListenerId, Row};
use crate::user::GraphUser;
use ariob_crypto::{CryptoSuite, DefaultSuite, HashAlgorithm, KeyPair};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// How [`MemoryGraph`] answers a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckMode {
    /// Apply and acknowledge on the next scheduler turn.
    Immediate,
    /// Apply now, acknowledge after the delay.
    Delayed(Duration),
    /// Apply, but hold the acknowledgment until released.
    Silent,
    /// Apply and drop the acknowledgment sender unanswered.
    Dropped,
    /// Refuse the write with this error.
    Reject(String),
    /// Refuse with this error only if the node already holds a value.
    RejectExisting(String),
}

struct GraphState {
    nodes: BTreeMap<String, Value>,
    listeners: HashMap<u64, (String, Listener)>,
    next_listener: u64,
    default_ack: AckMode,
    ack_rules: Vec<(String, AckMode)>,
    row_delay: Duration,
    read_delay: Duration,
    held_acks: Vec<oneshot::Sender<Ack>>,
}

impl std::fmt::Debug for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphState")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("default_ack", &self.default_ack)
            .field("held_acks", &self.held_acks.len())
            .finish()
    }
}

impl GraphState {
    fn ack_mode_for(&self, path: &str) -> AckMode {
        self.ack_rules
            .iter()
            .rev()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, mode)| mode.clone())
            .unwrap_or_else(|| self.default_ack.clone())
    }

    fn listeners_for(&self, path: &str) -> Vec<Listener> {
        self.listeners
            .values()
            .filter(|(p, _)| p == path)
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    fn children(&self, parent: &str) -> Vec<Row> {
        let prefix = format!("{parent}/");
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, v)| {
                let key = &k[prefix.len()..];
                (!key.contains('/')).then(|| (key.to_string(), v.clone()))
            })
            .collect()
    }
}

/// In-process [`GraphStore`].
///
/// Writes apply synchronously; acknowledgments, reads, rows and listener
/// callbacks are delivered from spawned tasks, so a tokio runtime must be
/// running.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GraphState {
                nodes: BTreeMap::new(),
                listeners: HashMap::new(),
                next_listener: 0,
                default_ack: AckMode::Immediate,
                ack_rules: Vec::new(),
                row_delay: Duration::ZERO,
                read_delay: Duration::ZERO,
                held_acks: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Fault injection ──────────────────────────────────────────

    /// Acknowledgment behaviour for paths without a matching rule.
    pub fn set_ack_mode(&self, mode: AckMode) {
        self.lock().default_ack = mode;
    }

    /// Acknowledgment behaviour for paths starting with `prefix`.
    /// Later rules win over earlier ones.
    pub fn set_ack_mode_for(&self, prefix: impl Into<String>, mode: AckMode) {
        self.lock().ack_rules.push((prefix.into(), mode));
    }

    /// Delay before each row of a `map` stream.
    pub fn set_row_delay(&self, delay: Duration) {
        self.lock().row_delay = delay;
    }

    /// Delay before a `once` read answers.
    pub fn set_read_delay(&self, delay: Duration) {
        self.lock().read_delay = delay;
    }

    /// Answers every acknowledgment held back by [`AckMode::Silent`].
    pub fn release_held_acks(&self, ack: Ack) -> usize {
        let held = std::mem::take(&mut self.lock().held_acks);
        let count = held.len();
        for tx in held {
            let _ = tx.send(ack.clone());
        }
        count
    }

    // ── Inspection ───────────────────────────────────────────────

    /// Raw node value, bypassing delivery.
    pub fn node(&self, path: &str) -> Option<Value> {
        self.lock().nodes.get(path).cloned()
    }

    /// Overwrites a node without acknowledgments or listener callbacks.
    pub fn set_node(&self, path: impl Into<String>, value: Value) {
        self.lock().nodes.insert(path.into(), value);
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }
}

impl GraphStore for MemoryGraph {
    fn put(&self, path: &str, value: Value) -> oneshot::Receiver<Ack> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();

        let mode = state.ack_mode_for(path);
        let conflict = match &mode {
            AckMode::Reject(reason) => Some(reason.clone()),
            AckMode::RejectExisting(reason) => state
                .nodes
                .get(path)
                .filter(|v| !v.is_null())
                .map(|_| reason.clone()),
            _ => None,
        };
        if let Some(reason) = conflict {
            drop(state);
            debug!(path, %reason, "rejecting write");
            tokio::spawn(async move {
                let _ = tx.send(Err(GraphError::Rejected(reason)));
            });
            return rx;
        }

        trace!(path, "applying write");
        state.nodes.insert(path.to_string(), value.clone());
        let listeners = state.listeners_for(path);

        match mode {
            AckMode::Silent => state.held_acks.push(tx),
            AckMode::Dropped => drop(tx),
            AckMode::Delayed(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Ok(()));
                });
            }
            _ => {
                tokio::spawn(async move {
                    let _ = tx.send(Ok(()));
                });
            }
        }
        drop(state);

        if !listeners.is_empty() {
            let update = (!value.is_null()).then_some(value);
            tokio::spawn(async move {
                for listener in listeners {
                    listener(update.clone());
                }
            });
        }
        rx
    }

    fn once(&self, path: &str) -> oneshot::Receiver<Option<Value>> {
        let (tx, rx) = oneshot::channel();
        let state = self.lock();
        let value = state.nodes.get(path).filter(|v| !v.is_null()).cloned();
        let delay = state.read_delay;
        drop(state);

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = tx.send(value);
        });
        rx
    }

    fn map(&self, path: &str) -> mpsc::UnboundedReceiver<Row> {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = self.lock();
        let rows = state.children(path);
        let delay = state.row_delay;
        drop(state);

        tokio::spawn(async move {
            for row in rows {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(row).is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn on(&self, path: &str, listener: Listener) -> ListenerId {
        let mut state = self.lock();
        let id = state.next_listener;
        state.next_listener += 1;
        state
            .listeners
            .insert(id, (path.to_string(), Arc::clone(&listener)));
        let current = state.nodes.get(path).filter(|v| !v.is_null()).cloned();
        drop(state);

        if let Some(value) = current {
            tokio::spawn(async move { listener(Some(value)) });
        }
        ListenerId(id)
    }

    fn off(&self, id: ListenerId) {
        self.lock().listeners.remove(&id.0);
    }
}

#[derive(Debug)]
struct UserRecord {
    salt: String,
    digest: String,
    pair: KeyPair,
}

#[derive(Debug, Default)]
struct UserState {
    users: HashMap<String, UserRecord>,
    current: Option<String>,
    fail_create: Option<String>,
    fail_auth: Option<String>,
}

/// In-process [`GraphUser`].
///
/// Passwords are kept only as salted SHA-256 digests.
#[derive(Debug, Clone)]
pub struct MemoryUser {
    suite: Arc<dyn CryptoSuite>,
    state: Arc<Mutex<UserState>>,
}

impl Default for MemoryUser {
    fn default() -> Self {
        Self::new(Arc::new(DefaultSuite::default()))
    }
}

impl MemoryUser {
    pub fn new(suite: Arc<dyn CryptoSuite>) -> Self {
        Self {
            suite,
            state: Arc::new(Mutex::new(UserState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UserState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn digest(&self, salt: &str, password: &str) -> String {
        self.suite
            .hash(format!("{salt}{password}").as_bytes(), HashAlgorithm::Sha256)
    }

    /// Makes every `create` fail with `reason` until cleared with `None`.
    pub fn fail_create_with(&self, reason: Option<String>) {
        self.lock().fail_create = reason;
    }

    /// Makes every `auth`/`auth_pair` fail with `reason` until cleared.
    pub fn fail_auth_with(&self, reason: Option<String>) {
        self.lock().fail_auth = reason;
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }
}

#[async_trait]
impl GraphUser for MemoryUser {
    async fn create(&self, alias: &str, password: &str) -> GraphResult<KeyPair> {
        if let Some(reason) = self.lock().fail_create.clone() {
            return Err(GraphError::Auth(reason));
        }
        if self.lock().users.contains_key(alias) {
            return Err(GraphError::Auth("user already created".to_string()));
        }

        let pair = self.suite.generate_key_pair();
        let salt = self.suite.random_id(16);
        let digest = self.digest(&salt, password);
        self.lock().users.insert(
            alias.to_string(),
            UserRecord {
                salt,
                digest,
                pair: pair.clone(),
            },
        );
        debug!(alias, "created graph user");
        Ok(pair)
    }

    async fn auth(&self, alias: &str, password: &str) -> GraphResult<KeyPair> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_auth.clone() {
            return Err(GraphError::Auth(reason));
        }
        let pair = match state.users.get(alias) {
            Some(record) if record.digest == self.digest(&record.salt, password) => {
                record.pair.clone()
            }
            _ => return Err(GraphError::Auth("wrong user or password".to_string())),
        };
        state.current = Some(pair.public.clone());
        Ok(pair)
    }

    async fn auth_pair(&self, pair: &KeyPair) -> GraphResult<()> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_auth.clone() {
            return Err(GraphError::Auth(reason));
        }
        pair.validate()
            .map_err(|e| GraphError::Auth(format!("invalid key pair: {e}")))?;
        state.current = Some(pair.public.clone());
        Ok(())
    }

    fn leave(&self) {
        self.lock().current = None;
    }

    fn is(&self) -> Option<String> {
        self.lock().current.clone()
    }
}
