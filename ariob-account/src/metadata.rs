use crate::error::AccountError;
use ariob_storage::{KeyValueStore, KeyValueStoreExt};
use ariob_types::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Plaintext description of a locally known identity. Never holds keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    /// The identity's public key.
    pub id: String,
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: i64,
    pub last_used_at: i64,
    pub is_active: bool,
}

/// User-editable metadata fields; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    pub alias: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

impl MetadataPatch {
    fn apply(&self, metadata: &mut AccountMetadata) {
        if let Some(alias) = &self.alias {
            metadata.alias = alias.clone();
        }
        if let Some(display_name) = &self.display_name {
            metadata.display_name = Some(display_name.clone());
        }
        if let Some(avatar) = &self.avatar {
            metadata.avatar = Some(avatar.clone());
        }
    }
}

/// The flat metadata list and the active-account pointer.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    store: Arc<dyn KeyValueStore>,
    metadata_key: String,
    active_key: String,
}

impl Registry {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, metadata_key: String, active_key: String) -> Self {
        Self {
            store,
            metadata_key,
            active_key,
        }
    }

    pub(crate) fn all(&self) -> AppResult<Vec<AccountMetadata>> {
        Ok(self.store.get_json(&self.metadata_key)?.unwrap_or_default())
    }

    pub(crate) fn find(&self, id: &str) -> AppResult<Option<AccountMetadata>> {
        Ok(self.all()?.into_iter().find(|account| account.id == id))
    }

    fn save(&self, accounts: &[AccountMetadata]) -> AppResult<()> {
        Ok(self.store.set_json(&self.metadata_key, accounts)?)
    }

    /// Inserts or replaces by id.
    pub(crate) fn upsert(&self, metadata: AccountMetadata) -> AppResult<()> {
        let mut accounts = self.all()?;
        match accounts.iter_mut().find(|account| account.id == metadata.id) {
            Some(existing) => *existing = metadata,
            None => accounts.push(metadata),
        }
        self.save(&accounts)
    }

    pub(crate) fn edit(&self, id: &str, patch: &MetadataPatch) -> AppResult<AccountMetadata> {
        let mut accounts = self.all()?;
        let account = accounts
            .iter_mut()
            .find(|account| account.id == id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        patch.apply(account);
        let updated = account.clone();
        self.save(&accounts)?;
        Ok(updated)
    }

    /// Marks exactly `id` active, stamping its last use.
    pub(crate) fn activate(&self, id: &str, now: i64) -> AppResult<AccountMetadata> {
        let mut accounts = self.all()?;
        let mut activated = None;
        for account in &mut accounts {
            account.is_active = account.id == id;
            if account.is_active {
                account.last_used_at = now;
                activated = Some(account.clone());
            }
        }
        let activated = activated.ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        self.save(&accounts)?;
        self.store.set_string(&self.active_key, id)?;
        Ok(activated)
    }

    /// Clears every active flag and the pointer.
    pub(crate) fn deactivate_all(&self) -> AppResult<()> {
        let mut accounts = self.all()?;
        for account in &mut accounts {
            account.is_active = false;
        }
        self.save(&accounts)?;
        Ok(self.store.remove(&self.active_key)?)
    }

    /// Returns whether an entry was removed.
    pub(crate) fn remove(&self, id: &str) -> AppResult<bool> {
        let mut accounts = self.all()?;
        let before = accounts.len();
        accounts.retain(|account| account.id != id);
        let removed = accounts.len() != before;
        self.save(&accounts)?;
        if self.active_id()?.as_deref() == Some(id) {
            self.store.remove(&self.active_key)?;
        }
        Ok(removed)
    }

    pub(crate) fn active_id(&self) -> AppResult<Option<String>> {
        Ok(self.store.get_string(&self.active_key)?)
    }
}
