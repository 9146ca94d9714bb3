//! The cryptographic suite consumed by the data and vault layers.

use crate::cipher::{self, Sealed};
use crate::error::{CryptoError, CryptoResult};
use crate::hash::HashAlgorithm;
use crate::key::{self, DerivedKey, KdfParams, Salt};
use crate::pair::KeyPair;
use bip39::Mnemonic;
use rand::RngCore;
use zeroize::Zeroize;

/// Hashing, encryption and key generation behind one object-safe seam.
pub trait CryptoSuite: Send + Sync + std::fmt::Debug {
    /// Hex digest of `data`.
    fn hash(&self, data: &[u8], algorithm: HashAlgorithm) -> String;

    /// Encrypts and returns the base64 sealed record, `nonce || ciphertext || tag`.
    fn encrypt(&self, plaintext: &[u8], key: &DerivedKey) -> CryptoResult<String>;

    /// Reverses [`CryptoSuite::encrypt`]; fails on tampering or a wrong key.
    fn decrypt(&self, ciphertext: &str, key: &DerivedKey) -> CryptoResult<Vec<u8>>;

    /// Stretches `secret` into a symmetric key.
    fn derive_key(&self, secret: &str, salt: &Salt) -> CryptoResult<DerivedKey>;

    fn generate_key_pair(&self) -> KeyPair;

    /// Key pair derived from a BIP-39 phrase and optional passphrase.
    fn pair_from_mnemonic(&self, phrase: &str, passphrase: &str) -> CryptoResult<KeyPair>;

    /// A fresh 12-word English phrase.
    fn generate_mnemonic(&self) -> CryptoResult<String>;

    fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// `len` random bytes, hex encoded.
    fn random_id(&self, len: usize) -> String {
        hex::encode(self.random_bytes(len))
    }
}

/// SHA-256, ChaCha20-Poly1305, Argon2id, Ed25519/X25519.
#[derive(Clone, Debug, Default)]
pub struct DefaultSuite {
    kdf: KdfParams,
}

impl DefaultSuite {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }
}

impl CryptoSuite for DefaultSuite {
    fn hash(&self, data: &[u8], algorithm: HashAlgorithm) -> String {
        algorithm.digest_hex(data)
    }

    fn encrypt(&self, plaintext: &[u8], key: &DerivedKey) -> CryptoResult<String> {
        Ok(cipher::seal(key, plaintext)?.to_base64())
    }

    fn decrypt(&self, ciphertext: &str, key: &DerivedKey) -> CryptoResult<Vec<u8>> {
        cipher::open(key, &Sealed::from_base64(ciphertext)?)
    }

    fn derive_key(&self, secret: &str, salt: &Salt) -> CryptoResult<DerivedKey> {
        key::derive_key(secret, salt, &self.kdf)
    }

    fn generate_key_pair(&self) -> KeyPair {
        KeyPair::generate()
    }

    fn pair_from_mnemonic(&self, phrase: &str, passphrase: &str) -> CryptoResult<KeyPair> {
        let normalized = phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        let mnemonic = Mnemonic::parse_normalized(&normalized)
            .map_err(|e| CryptoError::InvalidKeyPair(format!("invalid mnemonic: {e}")))?;

        let seed = mnemonic.to_seed_normalized(passphrase);
        let mut sign_seed = [0u8; 32];
        let mut enc_seed = [0u8; 32];
        sign_seed.copy_from_slice(&seed[..32]);
        enc_seed.copy_from_slice(&seed[32..]);
        let pair = KeyPair::from_seeds(&sign_seed, &enc_seed);
        sign_seed.zeroize();
        enc_seed.zeroize();
        Ok(pair)
    }

    fn generate_mnemonic(&self) -> CryptoResult<String> {
        let mut entropy = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(mnemonic.to_string())
    }

    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        bytes
    }
}
