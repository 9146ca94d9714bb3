//! Content-addressed immutable storage on the graph.
//!
//! A payload is canonicalized (strings as their raw text, everything else
//! as key-sorted JSON), hashed with SHA-256 and stored as text under
//! `#<prefix>/<hash>`, or `#/<hash>` without a prefix. Optional metadata
//! lives beside it under `#<prefix>#meta/<hash>`.

use crate::ack::{await_ack, await_read, collect_rows};
use crate::config::FreezeConfig;
use ariob_crypto::{canonicalize, CryptoSuite, HashAlgorithm};
use ariob_graph::{child_path, GraphStore};
use ariob_types::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A payload together with the hash it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frozen<T = Value> {
    pub hash: String,
    pub data: T,
}

#[derive(Debug, Clone, Default)]
pub struct FreezeOptions {
    /// Namespace for the stored payload.
    pub prefix: Option<String>,
    /// Non-sensitive description stored beside the payload.
    pub metadata: Option<Value>,
}

impl FreezeOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ThawOptions {
    /// Must match the prefix the payload was frozen under.
    pub prefix: Option<String>,
    /// Recompute the hash and reject a mismatch.
    pub verify: bool,
}

impl Default for ThawOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            verify: true,
        }
    }
}

impl ThawOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn unverified(mut self) -> Self {
        self.verify = false;
        self
    }
}

/// Freeze, thaw and immutable links over a [`GraphStore`].
#[derive(Debug, Clone)]
pub struct FrozenStore {
    graph: Arc<dyn GraphStore>,
    suite: Arc<dyn CryptoSuite>,
    config: FreezeConfig,
}

impl FrozenStore {
    pub fn new(graph: Arc<dyn GraphStore>, suite: Arc<dyn CryptoSuite>, config: FreezeConfig) -> Self {
        Self {
            graph,
            suite,
            config,
        }
    }

    /// The content hash `data` would be frozen under.
    pub fn hash<T: Serialize>(&self, data: &T) -> AppResult<String> {
        Ok(self.digest(&serde_json::to_value(data)?))
    }

    fn digest(&self, value: &Value) -> String {
        self.suite
            .hash(canonicalize(value).as_bytes(), HashAlgorithm::Sha256)
    }

    /// Stores `data` under its content hash.
    ///
    /// Freezing content that is already stored succeeds with the same hash.
    pub async fn freeze<T: Serialize>(&self, data: T, options: FreezeOptions) -> AppResult<Frozen<T>> {
        let value = serde_json::to_value(&data)?;
        let text = canonicalize(&value);
        let hash = self.suite.hash(text.as_bytes(), HashAlgorithm::Sha256);
        let base = base_path(options.prefix.as_deref());
        let path = child_path(&base, &hash);

        let rx = self.graph.put(&path, Value::String(text));
        match await_ack(rx, self.config.ack_timeout(), &path).await {
            Ok(()) => {
                if let Some(metadata) = options.metadata {
                    let meta_path = child_path(&format!("{base}#meta"), &hash);
                    let rx = self.graph.put(&meta_path, metadata);
                    if let Err(err) = await_ack(rx, self.config.ack_timeout(), &meta_path).await {
                        warn!(path = %meta_path, error = %err, "metadata write rejected");
                    }
                }
                debug!(path, "frozen");
            }
            Err(err) if is_existing_content(&err) => {
                debug!(path, "content already frozen");
            }
            Err(err) => return Err(err),
        }
        Ok(Frozen { hash, data })
    }

    /// Reads the payload stored under `hash`.
    ///
    /// With verification on, content that no longer matches its hash is
    /// tombstoned and reported as a validation error, never returned.
    pub async fn thaw<T: DeserializeOwned>(&self, hash: &str, options: ThawOptions) -> AppResult<Frozen<T>> {
        let path = child_path(&base_path(options.prefix.as_deref()), hash);
        let stored = await_read(self.graph.once(&path), self.config.ack_timeout(), &path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no frozen data for hash {hash}")))?;

        let value = match stored {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            other => other,
        };

        if options.verify {
            let actual = self.digest(&value);
            if actual != hash {
                warn!(path, "frozen content does not match its hash; purging");
                let rx = self.graph.put(&path, Value::Null);
                if let Err(err) = await_ack(rx, self.config.ack_timeout(), &path).await {
                    warn!(path, error = %err, "purge of mismatched content rejected");
                }
                return Err(AppError::validation("frozen data failed verification")
                    .with_cause(format!("expected {hash}, got {actual}")));
            }
        }

        let data = serde_json::from_value(value)?;
        Ok(Frozen {
            hash: hash.to_string(),
            data,
        })
    }

    /// Freezes a reference to a mutable graph path.
    pub async fn link(&self, soul: &str, prefix: Option<&str>) -> AppResult<Frozen<String>> {
        self.freeze(soul.to_string(), FreezeOptions {
            prefix: Some(link_prefix(prefix)),
            metadata: None,
        })
        .await
    }

    /// Reads back the path stored by [`FrozenStore::link`].
    pub async fn resolve(&self, hash: &str, prefix: Option<&str>) -> AppResult<Frozen<String>> {
        self.thaw(hash, ThawOptions::prefix(link_prefix(prefix))).await
    }

    /// Hashes frozen under `prefix`, collected for the configured window.
    pub async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.list_within(prefix, self.config.list_timeout()).await
    }

    /// Like [`FrozenStore::list`] with an explicit settle window.
    pub async fn list_within(&self, prefix: &str, window: Duration) -> AppResult<Vec<String>> {
        let rows = collect_rows(self.graph.map(&base_path(Some(prefix))), window).await;
        Ok(rows
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(hash, _)| hash)
            .collect())
    }

    /// Metadata stored beside a frozen payload, if any.
    pub async fn metadata(&self, hash: &str, prefix: Option<&str>) -> AppResult<Option<Value>> {
        let path = child_path(&format!("{}#meta", base_path(prefix)), hash);
        await_read(self.graph.once(&path), self.config.ack_timeout(), &path).await
    }
}

fn base_path(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("#{prefix}"),
        _ => "#".to_string(),
    }
}

fn link_prefix(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}#links"),
        _ => "links".to_string(),
    }
}

// The graph refuses to overwrite content-addressed nodes with an error
// naming the hash.
fn is_existing_content(err: &AppError) -> bool {
    err.cause.as_deref().is_some_and(|cause| cause.contains("hash"))
}
