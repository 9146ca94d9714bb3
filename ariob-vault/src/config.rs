use serde::{Deserialize, Serialize};

/// Secure-storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Prefix of every platform-storage key the vault and account layers own.
    pub namespace: String,
    /// Inactivity after which the session expires.
    pub session_timeout_ms: u64,
    /// How long before expiry the warning fires.
    pub warning_lead_ms: u64,
    pub auto_logout_enabled: bool,
    pub remember_session: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            namespace: "ariob_".to_string(),
            session_timeout_ms: 12 * 60 * 60 * 1000,
            warning_lead_ms: 15 * 60 * 1000,
            auto_logout_enabled: true,
            remember_session: true,
        }
    }
}

impl VaultConfig {
    /// `<namespace><name>`.
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.namespace)
    }
}
