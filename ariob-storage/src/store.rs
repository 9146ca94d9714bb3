use crate::error::{StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};

/// Byte-oriented platform storage.
///
/// Keys are opaque strings. No transactions, no size limits.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    fn clear(&self) -> StorageResult<()>;

    /// Every stored key, in no particular order.
    fn keys(&self) -> StorageResult<Vec<String>>;

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// String and JSON helpers over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        match self.get(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StorageError::InvalidData(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.set(key, value.as_bytes())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.set(key, &serde_json::to_vec(value)?)
    }

    /// Keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
