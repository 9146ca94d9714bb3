//! Data access for Ariob.
//!
//! - [`Adapter`] is the uniform get/put/remove/list/watch contract over a
//!   backing store, with three implementations: [`GraphAdapter`] (the
//!   shared graph), [`ScopedAdapter`] (the authenticated user's private
//!   region of it) and [`MemoryAdapter`] (in-process)
//! - [`SubscriptionManager`] keeps at most one live listener per key
//! - [`EntityService`] composes a validator, an adapter and a subscription
//!   manager into typed CRUD plus watch
//! - [`FrozenStore`] is content-addressed immutable storage on the graph
//!
//! The graph has no durable-write signal. Writes race their acknowledgment
//! against [`AdapterConfig::ack_timeout`] and succeed optimistically when it
//! expires; listings collect rows for [`AdapterConfig::settle_window`]. Both
//! are liveness bounds, not correctness guarantees: a listing is a
//! best-effort snapshot.

mod ack;
mod adapter;
mod config;
mod freeze;
mod service;
mod subscription;

pub use adapter::{Adapter, GraphAdapter, MemoryAdapter, ScopedAdapter, Unsubscribe, WatchCallback};
pub use config::{AdapterConfig, FreezeConfig};
pub use freeze::{FreezeOptions, Frozen, FrozenStore, ThawOptions};
pub use service::{EntityService, EntityWatcher};
pub use subscription::SubscriptionManager;
