//! Core type definitions for Ariob.
//!
//! This crate defines the fundamental types shared by every layer of the
//! data-access stack:
//! - [`AppError`], the single error value that crosses module boundaries
//! - Entity identifiers (UUID v7)
//! - Millisecond clocks used for entity timestamps and session timing
//!
//! Domain types (things, schemas, credentials) live in `ariob-model`.

mod error;
mod ids;
mod timestamp;

pub use error::{AppError, AppResult, ErrorKind, Issue};
pub use ids::EntityId;
pub use timestamp::{Clock, ManualClock, SystemClock};
