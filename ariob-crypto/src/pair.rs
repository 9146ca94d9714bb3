//! Identity key pairs.
//!
//! A pair carries an Ed25519 signing key (`pub`/`priv`) and an X25519
//! key-agreement key (`epub`/`epriv`). All four are stored as unpadded
//! URL-safe base64 so they can travel inside JSON credentials.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::SigningKey;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Public and private key material of one identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    #[serde(rename = "pub")]
    pub public: String,
    #[serde(rename = "priv")]
    pub private: String,
    #[serde(rename = "epub")]
    pub enc_public: String,
    #[serde(rename = "epriv")]
    pub enc_private: String,
}

impl KeyPair {
    /// Generates a fresh random pair.
    pub fn generate() -> Self {
        let mut sign_seed = [0u8; 32];
        let mut enc_seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut sign_seed);
        rand::rngs::OsRng.fill_bytes(&mut enc_seed);
        let pair = Self::from_seeds(&sign_seed, &enc_seed);
        sign_seed.zeroize();
        enc_seed.zeroize();
        pair
    }

    /// Deterministic pair from two 32-byte secrets.
    pub fn from_seeds(sign_seed: &[u8; 32], enc_seed: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(sign_seed);
        let secret = StaticSecret::from(*enc_seed);
        let enc_public = X25519PublicKey::from(&secret);

        Self {
            public: URL_SAFE_NO_PAD.encode(signing.verifying_key().to_bytes()),
            private: URL_SAFE_NO_PAD.encode(signing.to_bytes()),
            enc_public: URL_SAFE_NO_PAD.encode(enc_public.as_bytes()),
            enc_private: URL_SAFE_NO_PAD.encode(secret.to_bytes()),
        }
    }

    /// Checks that every field decodes and that each public key belongs to
    /// its private key.
    pub fn validate(&self) -> CryptoResult<()> {
        let signing = SigningKey::from_bytes(&decode_32("priv", &self.private)?);
        let public = decode_32("pub", &self.public)?;
        if signing.verifying_key().to_bytes() != public {
            return Err(CryptoError::InvalidKeyPair(
                "pub does not match priv".to_string(),
            ));
        }

        let secret = StaticSecret::from(decode_32("epriv", &self.enc_private)?);
        let enc_public = decode_32("epub", &self.enc_public)?;
        if X25519PublicKey::from(&secret).to_bytes() != enc_public {
            return Err(CryptoError::InvalidKeyPair(
                "epub does not match epriv".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("pub", &self.public)
            .field("priv", &"[REDACTED]")
            .field("epub", &self.enc_public)
            .field("epriv", &"[REDACTED]")
            .finish()
    }
}

fn decode_32(field: &str, encoded: &str) -> CryptoResult<[u8; 32]> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidKeyPair(format!("{field}: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })
}
