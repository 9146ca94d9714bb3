use ariob_crypto::{CryptoSuite, HashAlgorithm};
use serde::{Deserialize, Serialize};

/// Format version written into new records.
pub const RECORD_VERSION: &str = "1.0";

/// An encrypted payload as kept in platform storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Base64 `nonce || ciphertext`.
    pub ciphertext: String,
    pub timestamp: i64,
    pub version: String,
}

impl EncryptedRecord {
    pub fn new(ciphertext: String, timestamp: i64) -> Self {
        Self {
            ciphertext,
            timestamp,
            version: RECORD_VERSION.to_string(),
        }
    }

    /// The exact bytes the integrity digest covers.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Digest over a serialized [`EncryptedRecord`], so the timestamp and
/// version are covered as well as the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    pub digest: String,
    pub algorithm: HashAlgorithm,
    pub timestamp: i64,
}

impl IntegrityRecord {
    pub fn over(
        record: &EncryptedRecord,
        suite: &dyn CryptoSuite,
        timestamp: i64,
    ) -> serde_json::Result<Self> {
        let algorithm = HashAlgorithm::Sha256;
        Ok(Self {
            digest: suite.hash(&record.canonical_bytes()?, algorithm),
            algorithm,
            timestamp,
        })
    }

    pub fn verifies(&self, record: &EncryptedRecord, suite: &dyn CryptoSuite) -> bool {
        match record.canonical_bytes() {
            Ok(bytes) => suite.hash(&bytes, self.algorithm) == self.digest,
            Err(_) => false,
        }
    }
}
