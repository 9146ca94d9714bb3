use ariob_crypto::{generate_random_key, DefaultSuite, KdfParams};
use ariob_storage::{
    FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, StorageError, StorageResult,
};
use ariob_types::{ErrorKind, SystemClock};
use ariob_vault::{
    EncryptedRecord, IntegrityRecord, RecoveryInfo, SecureStorage, SecurityQuestion,
    SessionState, VaultConfig,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Secret {
    name: String,
    value: u32,
}

fn secret() -> Secret {
    Secret {
        name: "pin".into(),
        value: 1234,
    }
}

fn vault_over(store: Arc<dyn KeyValueStore>) -> SecureStorage {
    SecureStorage::open(
        store,
        Arc::new(DefaultSuite::new(KdfParams::fast())),
        Arc::new(SystemClock::new()),
        VaultConfig::default(),
    )
    .unwrap()
}

/// Memory store whose reads of one key fail until cleared.
#[derive(Debug, Default)]
struct FailingStore {
    inner: MemoryStore,
    failing: Mutex<Option<String>>,
}

impl FailingStore {
    fn fail_reads_of(&self, key: Option<&str>) {
        *self.failing.lock().unwrap() = key.map(str::to_string);
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        if self.failing.lock().unwrap().as_deref() == Some(key) {
            return Err(StorageError::Io(std::io::Error::other("device busy")));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.inner.keys()
    }
}

fn vault() -> (Arc<MemoryStore>, SecureStorage) {
    let store = Arc::new(MemoryStore::new());
    let vault = vault_over(store.clone());
    (store, vault)
}

// ── Round trip ───────────────────────────────────────────────────

#[tokio::test]
async fn store_then_retrieve() {
    let (_, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    let back: Option<Secret> = vault.retrieve_encrypted("pin", None).unwrap();
    assert_eq!(back, Some(secret()));
}

#[tokio::test]
async fn missing_record_is_none() {
    let (_, vault) = vault();
    let back: Option<Secret> = vault.retrieve_encrypted("nothing", None).unwrap();
    assert_eq!(back, None);
}

#[tokio::test]
async fn plaintext_never_reaches_storage() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();

    let raw = store.get("ariob_encrypted_pin").unwrap().unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert!(!text.contains("1234"));
    assert!(store.contains("ariob_integrity_pin").unwrap());

    let record: EncryptedRecord = store.get_json("ariob_encrypted_pin").unwrap().unwrap();
    assert_eq!(record.version, "1.0");
}

#[tokio::test]
async fn explicit_key_is_required_to_read_back() {
    let (_, vault) = vault();
    let key = generate_random_key();
    vault.store_encrypted("explicit", &secret(), Some(&key)).unwrap();

    let back: Option<Secret> = vault.retrieve_encrypted("explicit", Some(&key)).unwrap();
    assert_eq!(back, Some(secret()));

    let err = vault
        .retrieve_encrypted::<Secret>("explicit", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn device_key_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    vault_over(store.clone())
        .store_encrypted("pin", &secret(), None)
        .unwrap();

    let reopened = vault_over(Arc::new(FileStore::open(dir.path()).unwrap()));
    let back: Option<Secret> = reopened.retrieve_encrypted("pin", None).unwrap();
    assert_eq!(back, Some(secret()));
}

// ── Integrity ────────────────────────────────────────────────────

#[tokio::test]
async fn tampered_ciphertext_is_purged() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();

    let mut record: EncryptedRecord = store.get_json("ariob_encrypted_pin").unwrap().unwrap();
    record.ciphertext = record.ciphertext.chars().rev().collect();
    store.set_json("ariob_encrypted_pin", &record).unwrap();

    let err = vault.retrieve_encrypted::<Secret>("pin", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!store.contains("ariob_encrypted_pin").unwrap());
    assert!(!store.contains("ariob_integrity_pin").unwrap());
}

#[tokio::test]
async fn tampered_timestamp_is_detected() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();

    let mut record: EncryptedRecord = store.get_json("ariob_encrypted_pin").unwrap().unwrap();
    record.timestamp += 1;
    store.set_json("ariob_encrypted_pin", &record).unwrap();

    assert!(vault.retrieve_encrypted::<Secret>("pin", None).is_err());
}

#[tokio::test]
async fn record_without_integrity_reads_as_absent() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    store.remove("ariob_integrity_pin").unwrap();

    assert_eq!(vault.retrieve_encrypted::<Secret>("pin", None).unwrap(), None);
    assert!(!store.contains("ariob_encrypted_pin").unwrap());
}

#[tokio::test]
async fn garbled_integrity_record_is_an_error() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    store.set("ariob_integrity_pin", b"{not json").unwrap();

    let err = vault.retrieve_encrypted::<Secret>("pin", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!store.contains("ariob_encrypted_pin").unwrap());
    assert!(!store.contains("ariob_integrity_pin").unwrap());
}

#[tokio::test]
async fn garbled_encrypted_record_is_an_error() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    store.set("ariob_encrypted_pin", b"\xff\x00").unwrap();

    let err = vault.retrieve_encrypted::<Secret>("pin", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!store.contains("ariob_integrity_pin").unwrap());
}

#[tokio::test]
async fn failed_integrity_read_keeps_the_record() {
    let store = Arc::new(FailingStore::default());
    let vault = vault_over(store.clone());
    vault.store_encrypted("pin", &secret(), None).unwrap();

    store.fail_reads_of(Some("ariob_integrity_pin"));
    let err = vault.retrieve_encrypted::<Secret>("pin", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(store.contains("ariob_encrypted_pin").unwrap());

    store.fail_reads_of(None);
    let back: Option<Secret> = vault.retrieve_encrypted("pin", None).unwrap();
    assert_eq!(back, Some(secret()));
}

#[tokio::test]
async fn integrity_record_covers_serialized_record() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    let record: EncryptedRecord = store.get_json("ariob_encrypted_pin").unwrap().unwrap();
    let integrity: IntegrityRecord = store.get_json("ariob_integrity_pin").unwrap().unwrap();
    assert!(integrity.verifies(&record, &DefaultSuite::default()));
}

// ── Removal ──────────────────────────────────────────────────────

#[tokio::test]
async fn remove_securely_deletes_both_records() {
    let (store, vault) = vault();
    vault.store_encrypted("pin", &secret(), None).unwrap();
    vault.remove_securely("pin").unwrap();
    assert!(!store.contains("ariob_encrypted_pin").unwrap());
    assert!(!store.contains("ariob_integrity_pin").unwrap());
}

#[tokio::test]
async fn clear_keeps_device_id_and_foreign_keys() {
    let (store, vault) = vault();
    vault.store_encrypted("a", &1, None).unwrap();
    vault.store_encrypted("b", &2, None).unwrap();
    store.set_string("other_app_key", "untouched").unwrap();
    let device_id = vault.device_id().unwrap();

    vault.clear_all_secure_data().unwrap();

    assert_eq!(vault.retrieve_encrypted::<i32>("a", None).unwrap(), None);
    assert_eq!(vault.device_id().unwrap(), device_id);
    assert_eq!(
        store.get_string("other_app_key").unwrap().as_deref(),
        Some("untouched")
    );
}

// ── Recovery ─────────────────────────────────────────────────────

#[tokio::test]
async fn recovery_info_roundtrip() {
    let (_, vault) = vault();
    let info = RecoveryInfo {
        recovery_code: Some("ABCD-EFGH".into()),
        backup_phrases: vec!["one two three".into()],
        security_questions: vec![SecurityQuestion {
            question: "pet?".into(),
            answer: "cat".into(),
        }],
    };
    vault.store_recovery_info("acct", &info).unwrap();

    assert_eq!(vault.recovery_info("acct").unwrap(), Some(info));
    assert_eq!(vault.recovery_info("other").unwrap(), None);
}

#[tokio::test]
async fn recovery_info_is_bound_to_account() {
    let (store, vault) = vault();
    vault
        .store_recovery_info("acct", &RecoveryInfo::default())
        .unwrap();

    // Move the record under another account id: its key no longer decrypts it.
    let record = store.get("ariob_encrypted_recovery_acct").unwrap().unwrap();
    let integrity = store.get("ariob_integrity_recovery_acct").unwrap().unwrap();
    store.set("ariob_encrypted_recovery_other", &record).unwrap();
    store.set("ariob_integrity_recovery_other", &integrity).unwrap();

    assert!(vault.recovery_info("other").is_err());
    assert_eq!(vault.session_state(), SessionState::Active);
}
