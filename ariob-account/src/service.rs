use crate::error::AccountError;
use crate::metadata::{AccountMetadata, MetadataPatch, Registry};
use crate::who::{AuthRequest, WhoService};
use ariob_crypto::CryptoSuite;
use ariob_model::{AuthMethod, Credentials, Who};
use ariob_types::{AppResult, Clock};
use ariob_vault::{
    RecoveryInfo, SecureStorage, SessionConfigPatch, SessionHandlers, SessionState, SessionStatus,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const METADATA_KEY: &str = "accounts_metadata";
const ACTIVE_KEY: &str = "active_account";

fn credentials_key(account_id: &str) -> String {
    format!("account_credentials_{account_id}")
}

/// Every identity known on this device, with exactly one of them active.
///
/// The active account (if any) is the identity the graph user system is
/// authenticated as. Operations that authenticate another identity along
/// the way restore the active one before returning.
#[derive(Debug)]
pub struct AccountService {
    who: Arc<WhoService>,
    vault: SecureStorage,
    registry: Registry,
    suite: Arc<dyn CryptoSuite>,
    clock: Arc<dyn Clock>,
    /// Serializes read-modify-write of the metadata list and the
    /// authenticated identity.
    ops: Mutex<()>,
}

impl AccountService {
    pub fn new(
        who: Arc<WhoService>,
        vault: SecureStorage,
        suite: Arc<dyn CryptoSuite>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Registry::new(
            Arc::clone(vault.store()),
            vault.config().key(METADATA_KEY),
            vault.config().key(ACTIVE_KEY),
        );
        let service = Self {
            who,
            vault,
            registry,
            suite,
            clock,
            ops: Mutex::new(()),
        };
        service.install_handlers(SessionHandlers::default());
        service
    }

    pub fn who(&self) -> &Arc<WhoService> {
        &self.who
    }

    pub fn vault(&self) -> &SecureStorage {
        &self.vault
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Creates a key-pair identity and stores it. The new account is not
    /// activated; use [`AccountService::switch_account`].
    ///
    /// Nothing is left behind if sign-up fails.
    pub async fn create_account(&self, alias: &str) -> AppResult<AccountMetadata> {
        let _guard = self.ops.lock().await;
        self.resume_session();

        let pair = self.suite.generate_key_pair();
        let id = pair.public.clone();
        let now = self.clock.now_ms();
        let credentials = Credentials {
            pair: pair.clone(),
            alias: Some(alias.to_string()),
            auth_method: Some(AuthMethod::Keypair),
        };
        let metadata = AccountMetadata {
            id: id.clone(),
            alias: alias.to_string(),
            display_name: None,
            avatar: None,
            created_at: now,
            last_used_at: now,
            is_active: false,
        };
        self.vault
            .store_encrypted(&credentials_key(&id), &credentials, None)?;
        self.registry.upsert(metadata.clone())?;

        let signup = self
            .who
            .signup(AuthRequest::KeyPair {
                alias: alias.to_string(),
                pair: Some(pair),
            })
            .await;
        if let Err(err) = signup {
            warn!(error = %err, "sign-up failed, rolling back account");
            self.discard(&id);
            self.restore_active().await;
            return Err(err);
        }

        self.restore_active().await;
        info!(account = %id, "account created");
        Ok(metadata)
    }

    /// Adds an identity from exported credentials. The identity must
    /// already have a profile; it is not activated.
    pub async fn import_account(
        &self,
        credentials_json: &str,
        alias: Option<&str>,
    ) -> AppResult<AccountMetadata> {
        let credentials = Credentials::parse(credentials_json)?;
        let id = credentials.pair.public.clone();

        let _guard = self.ops.lock().await;
        if self.registry.find(&id)?.is_some() {
            return Err(AccountError::AlreadyExists(id).into());
        }
        self.resume_session();

        let login = self
            .who
            .login(AuthRequest::KeyPair {
                alias: credentials.alias.clone().unwrap_or_default(),
                pair: Some(credentials.pair.clone()),
            })
            .await;
        let identity = match login {
            Ok(identity) => identity,
            Err(err) => {
                self.restore_active().await;
                return Err(err);
            }
        };

        let profile = &identity.profile.data;
        let metadata = AccountMetadata {
            id: id.clone(),
            alias: alias
                .map(str::to_string)
                .or_else(|| credentials.alias.clone())
                .unwrap_or_else(|| profile.alias.clone()),
            display_name: profile.display_name.clone(),
            avatar: profile.avatar.clone(),
            created_at: identity.profile.created_at,
            last_used_at: self.clock.now_ms(),
            is_active: false,
        };
        let stored = self
            .vault
            .store_encrypted(&credentials_key(&id), &credentials, None)
            .and_then(|()| self.registry.upsert(metadata.clone()));
        self.restore_active().await;
        if let Err(err) = stored {
            self.discard(&id);
            return Err(err);
        }

        info!(account = %id, "account imported");
        Ok(metadata)
    }

    /// Makes `id` the single active account and authenticates as it.
    ///
    /// On failure the previously active account stays active.
    pub async fn switch_account(&self, id: &str) -> AppResult<Who> {
        let _guard = self.ops.lock().await;
        if self.registry.find(id)?.is_none() {
            return Err(AccountError::NotFound(id.to_string()).into());
        }

        let login = match self.credentials(id) {
            Ok(credentials) => {
                self.who.logout();
                self.who
                    .login(AuthRequest::KeyPair {
                        alias: credentials.alias.unwrap_or_default(),
                        pair: Some(credentials.pair),
                    })
                    .await
            }
            Err(err) => Err(err),
        };
        let identity = match login {
            Ok(identity) => identity,
            Err(err) => {
                warn!(account = %id, error = %err, "switch failed");
                self.restore_active().await;
                return Err(err);
            }
        };

        if let Err(err) = self.registry.activate(id, self.clock.now_ms()) {
            warn!(account = %id, error = %err, "switch failed");
            self.restore_active().await;
            return Err(err);
        }
        self.vault.begin_session();
        info!(account = %id, "switched account");
        Ok(identity.profile)
    }

    /// Deletes an account's credentials and metadata. Removing the active
    /// account logs out and clears the active pointer.
    pub async fn remove_account(&self, id: &str) -> AppResult<()> {
        let _guard = self.ops.lock().await;
        let was_active = self.registry.active_id()?.as_deref() == Some(id);
        if !self.registry.remove(id)? {
            return Err(AccountError::NotFound(id.to_string()).into());
        }
        self.vault.remove_securely(&credentials_key(id))?;
        self.vault.remove_recovery_info(id)?;
        if was_active {
            self.who.logout();
        }
        info!(account = %id, was_active, "account removed");
        Ok(())
    }

    /// Plaintext credentials document for backup; import reverses it.
    pub fn export_account(&self, id: &str) -> AppResult<String> {
        if self.registry.find(id)?.is_none() {
            return Err(AccountError::NotFound(id.to_string()).into());
        }
        let credentials = self.credentials(id)?;
        info!(account = %id, "credentials exported");
        credentials.to_json()
    }

    /// Re-authenticates the persisted active account after a restart.
    ///
    /// Returns `None` when there is no active account, or when its
    /// credentials are gone (an expired session purges them), in which
    /// case the stale pointer is cleared.
    pub async fn restore(&self) -> AppResult<Option<Who>> {
        let _guard = self.ops.lock().await;
        let Some(id) = self.registry.active_id()? else {
            return Ok(None);
        };
        let credentials = match self.credentials(&id) {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(account = %id, error = %err, "cannot restore active account");
                self.registry.deactivate_all()?;
                self.who.logout();
                return Ok(None);
            }
        };
        let identity = self
            .who
            .login(AuthRequest::KeyPair {
                alias: credentials.alias.unwrap_or_default(),
                pair: Some(credentials.pair),
            })
            .await?;
        debug!(account = %id, "active account restored");
        Ok(Some(identity.profile))
    }

    // ── Metadata ─────────────────────────────────────────────────

    pub fn get_all_accounts(&self) -> AppResult<Vec<AccountMetadata>> {
        self.registry.all()
    }

    pub fn get_account(&self, id: &str) -> AppResult<Option<AccountMetadata>> {
        self.registry.find(id)
    }

    pub fn get_active_account(&self) -> AppResult<Option<AccountMetadata>> {
        match self.registry.active_id()? {
            Some(id) => self.registry.find(&id),
            None => Ok(None),
        }
    }

    pub async fn update_account_metadata(
        &self,
        id: &str,
        patch: MetadataPatch,
    ) -> AppResult<AccountMetadata> {
        let _guard = self.ops.lock().await;
        self.registry.edit(id, &patch)
    }

    // ── Recovery ─────────────────────────────────────────────────

    pub fn store_recovery_info(&self, id: &str, info: &RecoveryInfo) -> AppResult<()> {
        if self.registry.find(id)?.is_none() {
            return Err(AccountError::NotFound(id.to_string()).into());
        }
        self.vault.store_recovery_info(id, info)
    }

    pub fn recovery_info(&self, id: &str) -> AppResult<Option<RecoveryInfo>> {
        self.vault.recovery_info(id)
    }

    // ── Session ──────────────────────────────────────────────────

    pub fn configure_session(&self, patch: SessionConfigPatch, handlers: Option<SessionHandlers>) {
        if let Some(handlers) = handlers {
            self.install_handlers(handlers);
        }
        self.vault.set_session_config(patch);
    }

    pub fn session_status(&self) -> SessionStatus {
        self.vault.session_status()
    }

    pub fn extend_session(&self) -> AppResult<()> {
        self.vault.extend_session()
    }

    // ── Internals ────────────────────────────────────────────────

    /// Registers `handlers` with the vault. Expiry always logs the graph
    /// user out before the caller's `on_expired` runs.
    fn install_handlers(&self, handlers: SessionHandlers) {
        let who = Arc::clone(&self.who);
        let chained = handlers.on_expired;
        self.vault.set_session_handlers(SessionHandlers {
            on_warning: handlers.on_warning,
            on_expired: Some(Arc::new(move || {
                who.logout();
                info!("session expired; logged out");
                if let Some(on_expired) = &chained {
                    on_expired();
                }
            })),
        });
    }

    fn credentials(&self, id: &str) -> AppResult<Credentials> {
        self.vault
            .retrieve_encrypted(&credentials_key(id), None)?
            .ok_or_else(|| AccountError::MissingCredentials(id.to_string()).into())
    }

    /// Creating or importing an identity counts as re-authentication.
    fn resume_session(&self) {
        if self.vault.session_state() == SessionState::Expired {
            self.vault.begin_session();
        }
    }

    fn discard(&self, id: &str) {
        if let Err(err) = self.registry.remove(id) {
            warn!(account = %id, error = %err, "failed to drop account metadata");
        }
        if let Err(err) = self.vault.remove_securely(&credentials_key(id)) {
            warn!(account = %id, error = %err, "failed to drop account credentials");
        }
    }

    /// Puts the graph user system back on the active account, or logs out
    /// when there is none.
    async fn restore_active(&self) {
        let active = match self.registry.active_id() {
            Ok(active) => active,
            Err(err) => {
                warn!(error = %err, "cannot read active account");
                None
            }
        };
        let Some(id) = active else {
            self.who.logout();
            return;
        };
        if self.who.public_key().as_deref() == Some(id.as_str()) {
            return;
        }
        let restored = match self.credentials(&id) {
            Ok(credentials) => self
                .who
                .login(AuthRequest::KeyPair {
                    alias: credentials.alias.unwrap_or_default(),
                    pair: Some(credentials.pair),
                })
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = restored {
            warn!(account = %id, error = %err, "could not re-authenticate active account");
            self.who.logout();
        }
    }
}
