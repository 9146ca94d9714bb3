use ariob_crypto::KdfParams;
use ariob_data::{AdapterConfig, FreezeConfig};
use ariob_types::{AppError, AppResult};
use ariob_vault::VaultConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level settings. Every section falls back to its defaults, so a
/// config file only needs the fields it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub adapter: AdapterConfig,
    pub freeze: FreezeConfig,
    pub vault: VaultConfig,
    /// Argon2id cost of every derived key.
    pub kdf: KdfParams,
    /// `tracing` filter directive, e.g. `"info,ariob_vault=debug"`.
    pub log_filter: Option<String>,
    /// Directory for platform storage; `None` keeps everything in memory.
    pub storage_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::storage(format!("cannot read config {}", path.display())).with_cause(e)
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
