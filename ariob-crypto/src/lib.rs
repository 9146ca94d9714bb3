//! Cryptographic suite for Ariob.
//!
//! Provides the primitives the data-access layer is built on:
//! - SHA-256 content hashing over canonical JSON (content addressing and
//!   integrity records)
//! - ChaCha20-Poly1305 authenticated encryption for records at rest
//! - Argon2id key derivation from device ids, passphrases and labels
//! - Identity key pairs: Ed25519 for signing (`pub`/`priv`) and X25519
//!   for key agreement (`epub`/`epriv`)
//!
//! Services depend on `Arc<dyn CryptoSuite>` so tests and platforms can
//! substitute their own implementation; [`DefaultSuite`] wires the
//! functions of this crate together.

mod cipher;
mod error;
mod hash;
mod key;
mod pair;
mod suite;

pub use cipher::{open, seal, Sealed, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use hash::{canonical_json, canonicalize, sha256_hex, HashAlgorithm};
pub use key::{derive_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use pair::KeyPair;
pub use suite::{CryptoSuite, DefaultSuite};
