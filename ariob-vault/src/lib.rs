//! Secure storage for Ariob.
//!
//! [`SecureStorage`] encrypts payloads before they reach platform storage,
//! pairs every encrypted record with an integrity record and verifies it on
//! read. It also owns the session: every successful read or write counts as
//! activity, and a timeout state machine (`Active` → `Warning` → `Expired`)
//! purges all secure data when the session lapses.
//!
//! # Storage layout
//!
//! All keys share the configured namespace (default `ariob_`):
//!
//! | Key | Contents |
//! |-----|----------|
//! | `<ns>encrypted_<key>` | [`EncryptedRecord`] |
//! | `<ns>integrity_<key>` | [`IntegrityRecord`] over the serialized encrypted record |
//! | `<ns>session_config` | [`SessionConfig`] |
//! | `<ns>device_id` | random device id the default key is derived from |

mod config;
mod device;
mod error;
mod record;
mod secure;
mod session;

pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use record::{EncryptedRecord, IntegrityRecord, RECORD_VERSION};
pub use secure::{RecoveryInfo, SecureStorage, SecurityQuestion};
pub use session::{
    SessionCallback, SessionConfig, SessionConfigPatch, SessionHandlers, SessionState,
    SessionStatus,
};
