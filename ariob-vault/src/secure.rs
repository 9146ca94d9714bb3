use crate::config::VaultConfig;
use crate::device::DeviceKeys;
use crate::error::{VaultError, VaultResult};
use crate::record::{EncryptedRecord, IntegrityRecord};
use crate::session::{
    SessionConfig, SessionConfigPatch, SessionHandlers, SessionState, SessionStatus,
};
use ariob_crypto::{CryptoSuite, DerivedKey};
use ariob_storage::{KeyValueStore, KeyValueStoreExt};
use ariob_types::{AppResult, Clock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const ENCRYPTED_PREFIX: &str = "encrypted_";
const INTEGRITY_PREFIX: &str = "integrity_";
const SESSION_CONFIG_KEY: &str = "session_config";

/// Recovery material kept for an account under a recovery-specific key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryInfo {
    pub recovery_code: Option<String>,
    pub backup_phrases: Vec<String>,
    pub security_questions: Vec<SecurityQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityQuestion {
    pub question: String,
    pub answer: String,
}

struct Session {
    config: SessionConfig,
    state: SessionState,
    handlers: SessionHandlers,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every re-arm; timers from an older arming do nothing.
    generation: u64,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    suite: Arc<dyn CryptoSuite>,
    clock: Arc<dyn Clock>,
    config: VaultConfig,
    device: DeviceKeys,
    session: Mutex<Session>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let session = self.session.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
    }
}

/// Encrypted, integrity-checked storage with an inactivity timeout.
///
/// Cloning shares the same session. Session timers run on the tokio
/// runtime current at the time they are armed; without one the session
/// never expires on its own.
#[derive(Clone)]
pub struct SecureStorage {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SecureStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.lock_session();
        f.debug_struct("SecureStorage")
            .field("namespace", &self.inner.config.namespace)
            .field("state", &session.state)
            .finish()
    }
}

impl SecureStorage {
    /// Opens the vault and resumes the persisted session.
    ///
    /// A persisted session that has already lapsed is expired (and its
    /// data purged) before this returns.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        suite: Arc<dyn CryptoSuite>,
        clock: Arc<dyn Clock>,
        config: VaultConfig,
    ) -> AppResult<Self> {
        let now = clock.now_ms();
        let persisted: Option<SessionConfig> = store
            .get_json(&config.key(SESSION_CONFIG_KEY))
            .unwrap_or_else(|err| {
                warn!(error = %err, "discarding unreadable session config");
                None
            });
        let session_config = persisted.unwrap_or(SessionConfig {
            last_activity_at: now,
            timeout_ms: config.session_timeout_ms,
            auto_logout_enabled: config.auto_logout_enabled,
            remember_session: config.remember_session,
        });

        let inner = Arc::new(Inner {
            store,
            suite,
            clock,
            config,
            device: DeviceKeys::default(),
            session: Mutex::new(Session {
                config: session_config,
                state: SessionState::Active,
                handlers: SessionHandlers::default(),
                timer: None,
                generation: 0,
            }),
        });

        let lapsed = {
            let mut session = inner.lock_session();
            inner.persist(&session.config);
            let state = session.config.state_at(now, inner.config.warning_lead_ms);
            if state == SessionState::Expired {
                session.state = SessionState::Expired;
                true
            } else {
                session.state = state;
                inner.arm(&mut session);
                false
            }
        };
        if lapsed {
            info!("persisted session had lapsed");
            inner.purge_logged();
        }
        Ok(Self { inner })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.inner.config
    }

    /// The platform store this vault writes to.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    pub fn device_id(&self) -> AppResult<String> {
        let inner = &self.inner;
        Ok(inner
            .device
            .device_id(inner.store.as_ref(), inner.suite.as_ref(), &inner.config)?)
    }

    // ── Records ──────────────────────────────────────────────────

    /// Encrypts `data` under `key`, with the device key unless
    /// `encryption_key` is given. Refused while the session is expired.
    pub fn store_encrypted<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        encryption_key: Option<&DerivedKey>,
    ) -> AppResult<()> {
        self.inner.store_encrypted(key, data, encryption_key)?;
        self.inner.touch();
        Ok(())
    }

    /// Decrypts the record under `key`; `None` if there is none.
    ///
    /// A record whose integrity record is missing or does not verify is
    /// purged. A mismatch is reported as a validation error.
    pub fn retrieve_encrypted<T: DeserializeOwned>(
        &self,
        key: &str,
        encryption_key: Option<&DerivedKey>,
    ) -> AppResult<Option<T>> {
        let value = self.inner.retrieve_encrypted(key, encryption_key)?;
        if value.is_some() {
            self.inner.touch();
        }
        Ok(value)
    }

    /// Deletes a record together with its integrity record.
    pub fn remove_securely(&self, key: &str) -> AppResult<()> {
        self.inner.remove_pair(key)?;
        self.inner.touch();
        Ok(())
    }

    /// Deletes every record in the namespace except the device id and the
    /// session settings.
    pub fn clear_all_secure_data(&self) -> AppResult<()> {
        Ok(self.inner.purge()?)
    }

    pub fn store_recovery_info(&self, account_id: &str, info: &RecoveryInfo) -> AppResult<()> {
        let key = self.recovery_key(account_id)?;
        self.store_encrypted(&recovery_record(account_id), info, Some(&key))
    }

    pub fn recovery_info(&self, account_id: &str) -> AppResult<Option<RecoveryInfo>> {
        let key = self.recovery_key(account_id)?;
        self.retrieve_encrypted(&recovery_record(account_id), Some(&key))
    }

    pub fn remove_recovery_info(&self, account_id: &str) -> AppResult<()> {
        self.remove_securely(&recovery_record(account_id))
    }

    fn recovery_key(&self, account_id: &str) -> VaultResult<DerivedKey> {
        let inner = &self.inner;
        inner.device.recovery_key(
            account_id,
            inner.store.as_ref(),
            inner.suite.as_ref(),
            &inner.config,
        )
    }

    // ── Session ──────────────────────────────────────────────────

    pub fn session_config(&self) -> SessionConfig {
        self.inner.lock_session().config.clone()
    }

    /// Applies `patch`, persists it and re-arms the timers if the expiry
    /// point moved.
    pub fn set_session_config(&self, patch: SessionConfigPatch) {
        let mut session = self.inner.lock_session();
        session.config.apply(&patch);
        self.inner.persist(&session.config);
        if patch.affects_timers() && session.state != SessionState::Expired {
            let now = self.inner.clock.now_ms();
            session.state = match session.config.state_at(now, self.inner.config.warning_lead_ms) {
                SessionState::Warning => SessionState::Warning,
                _ => SessionState::Active,
            };
            self.inner.arm(&mut session);
        }
    }

    pub fn set_session_handlers(&self, handlers: SessionHandlers) {
        self.inner.lock_session().handlers = handlers;
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.lock_session().state
    }

    pub fn session_status(&self) -> SessionStatus {
        let session = self.inner.lock_session();
        let remaining = session.config.remaining_ms(self.inner.clock.now_ms());
        SessionStatus {
            state: session.state,
            is_active: session.state != SessionState::Expired
                && (remaining > 0 || !session.config.auto_logout_enabled),
            time_remaining_ms: remaining,
            last_activity_at: session.config.last_activity_at,
        }
    }

    /// Resets the inactivity clock. Fails once the session has expired.
    pub fn extend_session(&self) -> AppResult<()> {
        if self.session_state() == SessionState::Expired {
            return Err(VaultError::SessionExpired.into());
        }
        self.inner.touch();
        Ok(())
    }

    /// Starts a fresh session after the caller re-authenticated, leaving
    /// `Expired` if necessary.
    pub fn begin_session(&self) {
        let mut session = self.inner.lock_session();
        session.state = SessionState::Active;
        session.config.last_activity_at = self.inner.clock.now_ms();
        self.inner.persist(&session.config);
        self.inner.arm(&mut session);
        debug!("session started");
    }
}

fn recovery_record(account_id: &str) -> String {
    format!("recovery_{account_id}")
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn encrypted_key(&self, key: &str) -> String {
        self.config.key(&format!("{ENCRYPTED_PREFIX}{key}"))
    }

    fn integrity_key(&self, key: &str) -> String {
        self.config.key(&format!("{INTEGRITY_PREFIX}{key}"))
    }

    fn resolve_key(&self, explicit: Option<&DerivedKey>) -> VaultResult<DerivedKey> {
        match explicit {
            Some(key) => Ok(key.clone()),
            None => self
                .device
                .storage_key(self.store.as_ref(), self.suite.as_ref(), &self.config),
        }
    }

    fn store_encrypted<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        encryption_key: Option<&DerivedKey>,
    ) -> VaultResult<()> {
        if self.lock_session().state == SessionState::Expired {
            return Err(VaultError::SessionExpired);
        }
        let secret = self.resolve_key(encryption_key)?;
        let plaintext = serde_json::to_vec(data)?;
        let now = self.clock.now_ms();

        let record = EncryptedRecord::new(self.suite.encrypt(&plaintext, &secret)?, now);
        let integrity = IntegrityRecord::over(&record, self.suite.as_ref(), now)?;
        self.store.set_json(&self.encrypted_key(key), &record)?;
        self.store.set_json(&self.integrity_key(key), &integrity)?;
        debug!(key, "stored encrypted record");
        Ok(())
    }

    fn retrieve_encrypted<T: DeserializeOwned>(
        &self,
        key: &str,
        encryption_key: Option<&DerivedKey>,
    ) -> VaultResult<Option<T>> {
        let Some(record) = self.load_part::<EncryptedRecord>(key, &self.encrypted_key(key))? else {
            return Ok(None);
        };
        match self.load_part::<IntegrityRecord>(key, &self.integrity_key(key))? {
            None => {
                warn!(key, "purging encrypted record without integrity record");
                self.remove_pair(key)?;
                return Ok(None);
            }
            Some(integrity) if !integrity.verifies(&record, self.suite.as_ref()) => {
                warn!(key, "integrity check failed; purging record");
                self.remove_pair(key)?;
                return Err(VaultError::Integrity(key.to_string()));
            }
            Some(_) => {}
        }

        let secret = self.resolve_key(encryption_key)?;
        let plaintext = self.suite.decrypt(&record.ciphertext, &secret)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    /// Reads one half of the record pair stored under `storage_key`.
    ///
    /// Storage failures propagate and leave both halves in place. Bytes
    /// that do not parse count as tampering and purge the pair.
    fn load_part<T: DeserializeOwned>(&self, key: &str, storage_key: &str) -> VaultResult<Option<T>> {
        let Some(bytes) = self.store.get(storage_key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(part) => Ok(Some(part)),
            Err(err) => {
                warn!(key, error = %err, "purging unparseable record");
                self.remove_pair(key)?;
                Err(VaultError::Integrity(key.to_string()))
            }
        }
    }

    fn remove_pair(&self, key: &str) -> VaultResult<()> {
        self.store.remove(&self.encrypted_key(key))?;
        self.store.remove(&self.integrity_key(key))?;
        Ok(())
    }

    fn purge(&self) -> VaultResult<()> {
        let keep = [
            DeviceKeys::device_id_key(&self.config),
            self.config.key(SESSION_CONFIG_KEY),
        ];
        let doomed: Vec<String> = self
            .store
            .keys_with_prefix(&self.config.namespace)?
            .into_iter()
            .filter(|key| !keep.contains(key))
            .collect();
        for key in &doomed {
            self.store.remove(key)?;
        }
        info!(count = doomed.len(), "cleared secure data");
        Ok(())
    }

    fn purge_logged(&self) {
        if let Err(err) = self.purge() {
            warn!(error = %err, "failed to clear secure data");
        }
    }

    fn persist(&self, config: &SessionConfig) {
        if let Err(err) = self.store.set_json(&self.config.key(SESSION_CONFIG_KEY), config) {
            warn!(error = %err, "failed to persist session config");
        }
    }

    /// Records activity: back to `Active` with fresh timers. No effect
    /// once expired.
    fn touch(self: &Arc<Self>) {
        let mut session = self.lock_session();
        if session.state == SessionState::Expired {
            return;
        }
        session.config.last_activity_at = self.clock.now_ms();
        session.state = SessionState::Active;
        self.persist(&session.config);
        self.arm(&mut session);
    }

    fn arm(self: &Arc<Self>, session: &mut Session) {
        session.generation += 1;
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
        if !session.config.auto_logout_enabled || session.state == SessionState::Expired {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime; session timers are not armed");
            return;
        };

        let remaining = session.config.remaining_ms(self.clock.now_ms());
        let lead = self.config.warning_lead_ms;
        let warn_after = (lead > 0 && remaining > lead).then(|| remaining - lead);
        let generation = session.generation;
        let weak = Arc::downgrade(self);

        session.timer = Some(runtime.spawn(async move {
            let mut waited = 0;
            if let Some(after) = warn_after {
                tokio::time::sleep(Duration::from_millis(after)).await;
                match weak.upgrade() {
                    Some(inner) => inner.enter_warning(generation),
                    None => return,
                }
                waited = after;
            }
            tokio::time::sleep(Duration::from_millis(remaining - waited)).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation);
            }
        }));
    }

    fn enter_warning(&self, generation: u64) {
        let callback = {
            let mut session = self.lock_session();
            if session.generation != generation || session.state != SessionState::Active {
                return;
            }
            session.state = SessionState::Warning;
            session.handlers.on_warning.clone()
        };
        info!("session entering warning period");
        if let Some(callback) = callback {
            callback();
        }
    }

    fn expire(&self, generation: u64) {
        let callback = {
            let mut session = self.lock_session();
            if session.generation != generation || session.state == SessionState::Expired {
                return;
            }
            session.state = SessionState::Expired;
            session.timer = None;
            session.handlers.on_expired.clone()
        };
        info!("session expired; clearing secure data");
        self.purge_logged();
        if let Some(callback) = callback {
            callback();
        }
    }
}
