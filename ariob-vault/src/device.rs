//! Device-bound key material.

use crate::config::VaultConfig;
use crate::error::VaultResult;
use ariob_crypto::{CryptoSuite, DerivedKey, Salt};
use ariob_storage::{KeyValueStore, KeyValueStoreExt};
use std::sync::Mutex;
use tracing::debug;

const DEVICE_ID_KEY: &str = "device_id";
const STORAGE_SALT: &str = "ariob_storage_salt";
const RECOVERY_SALT: &str = "ariob_recovery_salt";

/// Lazily created device id and the default storage key derived from it.
#[derive(Debug, Default)]
pub(crate) struct DeviceKeys {
    storage_key: Mutex<Option<DerivedKey>>,
}

impl DeviceKeys {
    pub(crate) fn device_id_key(config: &VaultConfig) -> String {
        config.key(DEVICE_ID_KEY)
    }

    /// The persisted device id, created on first use.
    pub(crate) fn device_id(
        &self,
        store: &dyn KeyValueStore,
        suite: &dyn CryptoSuite,
        config: &VaultConfig,
    ) -> VaultResult<String> {
        let key = Self::device_id_key(config);
        if let Some(id) = store.get_string(&key)? {
            return Ok(id);
        }
        let id = suite.random_id(32);
        store.set_string(&key, &id)?;
        debug!("created device id");
        Ok(id)
    }

    /// Default key for records stored without an explicit key.
    pub(crate) fn storage_key(
        &self,
        store: &dyn KeyValueStore,
        suite: &dyn CryptoSuite,
        config: &VaultConfig,
    ) -> VaultResult<DerivedKey> {
        let mut cached = self.storage_key.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }
        let device_id = self.device_id(store, suite, config)?;
        let key = suite.derive_key(&device_id, &Salt::from_label(STORAGE_SALT))?;
        *cached = Some(key.clone());
        Ok(key)
    }

    /// Key for an account's recovery information on this device.
    pub(crate) fn recovery_key(
        &self,
        account_id: &str,
        store: &dyn KeyValueStore,
        suite: &dyn CryptoSuite,
        config: &VaultConfig,
    ) -> VaultResult<DerivedKey> {
        let device_id = self.device_id(store, suite, config)?;
        Ok(suite.derive_key(
            &format!("{account_id}{device_id}"),
            &Salt::from_label(RECOVERY_SALT),
        )?)
    }
}
