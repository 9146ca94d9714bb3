use crate::config::AppConfig;
use ariob_account::{AccountService, WhoService};
use ariob_crypto::{CryptoSuite, DefaultSuite};
use ariob_data::{Adapter, EntityService, FrozenStore, GraphAdapter, ScopedAdapter};
use ariob_graph::{GraphStore, GraphUser, MemoryGraph, MemoryUser};
use ariob_model::{Schema, Validator, Who};
use ariob_storage::{FileStore, KeyValueStore, MemoryStore};
use ariob_types::{AppResult, Clock, SystemClock};
use ariob_vault::SecureStorage;
use std::sync::Arc;
use tracing::info;

/// Collaborators for [`AppContext`]; anything left unset gets the
/// in-process default.
#[derive(Debug, Default)]
pub struct AppContextBuilder {
    config: AppConfig,
    graph: Option<Arc<dyn GraphStore>>,
    user: Option<Arc<dyn GraphUser>>,
    store: Option<Arc<dyn KeyValueStore>>,
    suite: Option<Arc<dyn CryptoSuite>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AppContextBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn graph(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn user(mut self, user: Arc<dyn GraphUser>) -> Self {
        self.user = Some(user);
        self
    }

    /// Overrides `storage_dir`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn suite(mut self, suite: Arc<dyn CryptoSuite>) -> Self {
        self.suite = Some(suite);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> AppResult<AppContext> {
        let config = self.config;
        let suite: Arc<dyn CryptoSuite> = match self.suite {
            Some(suite) => suite,
            None => Arc::new(DefaultSuite::new(config.kdf.clone())),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let graph: Arc<dyn GraphStore> = match self.graph {
            Some(graph) => graph,
            None => Arc::new(MemoryGraph::new()),
        };
        let user: Arc<dyn GraphUser> = match self.user {
            Some(user) => user,
            None => Arc::new(MemoryUser::new(Arc::clone(&suite))),
        };
        let store: Arc<dyn KeyValueStore> = match (self.store, &config.storage_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(FileStore::open(dir)?),
            (None, None) => Arc::new(MemoryStore::new()),
        };

        let graph_adapter = GraphAdapter::new(Arc::clone(&graph), config.adapter.clone());
        let user_adapter: Arc<dyn Adapter> =
            Arc::new(ScopedAdapter::new(graph_adapter.clone(), Arc::clone(&user)));
        let adapter: Arc<dyn Adapter> = Arc::new(graph_adapter);
        let frozen = FrozenStore::new(
            Arc::clone(&graph),
            Arc::clone(&suite),
            config.freeze.clone(),
        );
        let vault = SecureStorage::open(
            Arc::clone(&store),
            Arc::clone(&suite),
            Arc::clone(&clock),
            config.vault.clone(),
        )?;
        let who = Arc::new(WhoService::new(
            Arc::clone(&user),
            Arc::clone(&adapter),
            Arc::clone(&suite),
            Arc::clone(&clock),
        ));
        let accounts = AccountService::new(
            Arc::clone(&who),
            vault.clone(),
            Arc::clone(&suite),
            Arc::clone(&clock),
        );

        info!(
            persistent = config.storage_dir.is_some(),
            namespace = %config.vault.namespace,
            "application context ready"
        );
        Ok(AppContext {
            config,
            suite,
            clock,
            graph,
            user,
            store,
            adapter,
            user_adapter,
            frozen,
            vault,
            who,
            accounts,
        })
    }
}

/// Every service of one application instance.
#[derive(Debug)]
pub struct AppContext {
    config: AppConfig,
    suite: Arc<dyn CryptoSuite>,
    clock: Arc<dyn Clock>,
    graph: Arc<dyn GraphStore>,
    user: Arc<dyn GraphUser>,
    store: Arc<dyn KeyValueStore>,
    adapter: Arc<dyn Adapter>,
    user_adapter: Arc<dyn Adapter>,
    frozen: FrozenStore,
    vault: SecureStorage,
    who: Arc<WhoService>,
    accounts: AccountService,
}

impl AppContext {
    /// In-process collaborators throughout.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        AppContextBuilder::new(config).build()
    }

    pub fn builder(config: AppConfig) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn suite(&self) -> &Arc<dyn CryptoSuite> {
        &self.suite
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn user(&self) -> &Arc<dyn GraphUser> {
        &self.user
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Adapter over the shared graph.
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// Adapter over the authenticated identity's own region.
    pub fn user_adapter(&self) -> &Arc<dyn Adapter> {
        &self.user_adapter
    }

    pub fn frozen(&self) -> &FrozenStore {
        &self.frozen
    }

    pub fn vault(&self) -> &SecureStorage {
        &self.vault
    }

    pub fn who(&self) -> &Arc<WhoService> {
        &self.who
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    /// Entities of type `D` under `prefix` in the shared graph.
    pub fn entity_service<D: Schema>(&self, prefix: &str) -> EntityService<D> {
        self.entities(prefix, Arc::clone(&self.adapter))
    }

    /// Entities of type `D` under `prefix` in the authenticated identity's
    /// region; every call fails while nobody is logged in.
    pub fn user_entity_service<D: Schema>(&self, prefix: &str) -> EntityService<D> {
        self.entities(prefix, Arc::clone(&self.user_adapter))
    }

    fn entities<D: Schema>(&self, prefix: &str, adapter: Arc<dyn Adapter>) -> EntityService<D> {
        EntityService::new(Validator::new(prefix, Arc::clone(&self.clock)), adapter)
            .with_identity(Arc::clone(&self.user))
    }

    /// Logs the persisted active account back in.
    pub async fn restore(&self) -> AppResult<Option<Who>> {
        self.accounts.restore().await
    }
}
