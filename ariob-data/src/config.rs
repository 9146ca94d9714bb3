//! Liveness bounds for graph operations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts applied by the graph-backed adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// How long a write waits for an acknowledgment before succeeding
    /// optimistically. Also bounds single reads.
    pub ack_timeout_ms: u64,
    /// How long a listing collects rows.
    pub settle_window_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 3_000,
            settle_window_ms: 300,
        }
    }
}

impl AdapterConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }
}

/// Timeouts applied by [`FrozenStore`](crate::FrozenStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeConfig {
    pub ack_timeout_ms: u64,
    /// Default settle window for [`FrozenStore::list`](crate::FrozenStore::list).
    pub list_timeout_ms: u64,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 3_000,
            list_timeout_ms: 300,
        }
    }
}

impl FreezeConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }
}
