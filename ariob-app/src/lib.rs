//! Application wiring for Ariob.
//!
//! [`AppContext`] owns one instance of every service and hands out shared
//! references; nothing in the workspace is a process-wide singleton.
//! Build it from an [`AppConfig`], optionally swapping in real
//! collaborators (graph store, user system, platform storage) through
//! [`AppContextBuilder`].

mod config;
mod context;
mod logging;

pub use config::AppConfig;
pub use context::{AppContext, AppContextBuilder};
pub use logging::init_tracing;
