//! Backing graph-store interface for Ariob.
//!
//! The data layer talks to a peer-to-peer graph store whose replication
//! is a black box. This crate pins down the slice of that store the data
//! layer depends on:
//!
//! - [`GraphStore`]: path-addressed reads, writes with an optional
//!   acknowledgment, child enumeration with no completion signal, and
//!   change listeners
//! - [`GraphUser`]: the store's user system (alias/password accounts and
//!   key-pair authentication)
//!
//! [`MemoryGraph`] and [`MemoryUser`] implement both in-process. Results
//! are delivered from spawned tasks, the way a networked store would
//! deliver them, and both expose fault injection for tests.

mod error;
mod memory;
mod store;
mod user;

pub use error::{GraphError, GraphResult};
pub use memory::{AckMode, MemoryGraph, MemoryUser};
pub use store::{child_path, Ack, GraphStore, Listener, ListenerId, Row};
pub use user::GraphUser;
