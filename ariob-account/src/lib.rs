//! Identities for Ariob.
//!
//! - [`WhoService`] signs identities up and in against the graph's user
//!   system (key pair, BIP-39 mnemonic or alias/password) and keeps their
//!   public profile at `who/<pub>`
//! - [`AccountService`] manages every identity known on this device: key
//!   pairs encrypted in [`SecureStorage`](ariob_vault::SecureStorage),
//!   plaintext [`AccountMetadata`] beside them, and a single active
//!   account that is always the one authenticated against the graph

mod error;
mod metadata;
mod service;
mod who;

pub use error::{AccountError, AccountResult};
pub use metadata::{AccountMetadata, MetadataPatch};
pub use service::AccountService;
pub use who::{AuthRequest, Identity, WhoService};
