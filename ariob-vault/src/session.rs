//! Session timeout state machine.
//!
//! ```text
//!            activity / extend                 activity / extend
//!          ┌──────────────┐                  ┌──────────────────┐
//!          ▼              │                  ▼                  │
//!      ┌────────┐  timeout - lead  ┌─────────┐    timeout   ┌─────────┐
//!      │ Active │ ───────────────▶ │ Warning │ ───────────▶ │ Expired │
//!      └────────┘                  └─────────┘              └─────────┘
//!          ▲                                                     │
//!          └──────────────────── begin_session ──────────────────┘
//! ```
//!
//! Expiry purges every secure record. Nothing leaves `Expired` except an
//! explicit `begin_session` after re-authentication.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Warning,
    Expired,
}

/// Persisted session settings and the last activity time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub last_activity_at: i64,
    pub timeout_ms: u64,
    pub auto_logout_enabled: bool,
    pub remember_session: bool,
}

impl SessionConfig {
    /// Milliseconds until expiry at `now`, zero once lapsed.
    pub fn remaining_ms(&self, now: i64) -> u64 {
        let elapsed = u64::try_from(now.saturating_sub(self.last_activity_at)).unwrap_or(0);
        self.timeout_ms.saturating_sub(elapsed)
    }

    /// Where the clock alone places the session; the timers move the
    /// stored state along the same boundaries.
    pub fn state_at(&self, now: i64, warning_lead_ms: u64) -> SessionState {
        if !self.auto_logout_enabled {
            return SessionState::Active;
        }
        match self.remaining_ms(now) {
            0 => SessionState::Expired,
            r if r <= warning_lead_ms => SessionState::Warning,
            _ => SessionState::Active,
        }
    }

    pub fn apply(&mut self, patch: &SessionConfigPatch) {
        if let Some(timeout) = patch.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(enabled) = patch.auto_logout_enabled {
            self.auto_logout_enabled = enabled;
        }
        if let Some(remember) = patch.remember_session {
            self.remember_session = remember;
        }
    }
}

/// Partial update for [`SessionConfig`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigPatch {
    pub timeout_ms: Option<u64>,
    pub auto_logout_enabled: Option<bool>,
    pub remember_session: Option<bool>,
}

impl SessionConfigPatch {
    /// Whether applying the patch changes when the session expires.
    pub fn affects_timers(&self) -> bool {
        self.timeout_ms.is_some() || self.auto_logout_enabled.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    pub is_active: bool,
    pub time_remaining_ms: u64,
    pub last_activity_at: i64,
}

pub type SessionCallback = Arc<dyn Fn() + Send + Sync>;

/// Callbacks fired by the session timers, outside any lock.
#[derive(Clone, Default)]
pub struct SessionHandlers {
    pub on_warning: Option<SessionCallback>,
    /// Runs after secure data has been purged.
    pub on_expired: Option<SessionCallback>,
}

impl std::fmt::Debug for SessionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandlers")
            .field("on_warning", &self.on_warning.is_some())
            .field("on_expired", &self.on_expired.is_some())
            .finish()
    }
}
