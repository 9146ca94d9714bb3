//! Platform key/value storage for Ariob.
//!
//! The secure-storage and account layers persist everything through the
//! [`KeyValueStore`] trait: a flat string-keyed map of byte values with no
//! transactions. Two implementations ship here:
//!
//! - [`MemoryStore`] keeps values in process memory (tests, ephemeral sessions)
//! - [`FileStore`] keeps one file per key under a directory, written
//!   atomically through a temp file and rename
//!
//! [`KeyValueStoreExt`] layers string and JSON helpers over any store.

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{KeyValueStore, KeyValueStoreExt};
