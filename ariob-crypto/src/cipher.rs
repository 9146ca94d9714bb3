//! Sealed records under ChaCha20-Poly1305.
//!
//! A sealed record is one contiguous buffer, `nonce || body || tag`, so
//! the stored base64 text and the in-memory value share a single layout.
//! Every seal draws a fresh random nonce.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305, Nonce, Tag,
};
use rand::RngCore;

/// Nonce length (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length.
pub const TAG_SIZE: usize = 16;

/// Authenticated ciphertext with its nonce in front and tag behind.
#[derive(Clone, PartialEq, Eq)]
pub struct Sealed(Vec<u8>);

impl Sealed {
    /// Wraps raw sealed bytes, rejecting anything too short to hold a
    /// nonce and a tag.
    pub fn from_bytes(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption(format!(
                "sealed record too short: {} bytes",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
        Self::from_bytes(bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_SIZE]
    }

    /// Encrypted payload followed by the tag.
    pub fn body(&self) -> &[u8] {
        &self.0[NONCE_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the plaintext this record opens to.
    pub fn plaintext_len(&self) -> usize {
        self.0.len() - NONCE_SIZE - TAG_SIZE
    }
}

impl std::fmt::Debug for Sealed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealed")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Encrypts `plaintext` under `key` into a fresh sealed record.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Sealed> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut buf = vec![0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf.reserve(plaintext.len() + TAG_SIZE);
    buf.extend_from_slice(plaintext);

    let (nonce, body) = buf.split_at_mut(NONCE_SIZE);
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", body)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    buf.extend_from_slice(&tag);
    Ok(Sealed(buf))
}

/// Decrypts a sealed record; a wrong key or any altered byte fails.
pub fn open(key: &DerivedKey, sealed: &Sealed) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let (payload, tag) = sealed.body().split_at(sealed.plaintext_len());

    let mut plaintext = payload.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(sealed.nonce()),
            b"",
            &mut plaintext,
            Tag::from_slice(tag),
        )
        .map_err(|_| CryptoError::Decryption("wrong key or tampered record".to_string()))?;
    Ok(plaintext)
}
