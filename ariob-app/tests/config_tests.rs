use ariob_app::{init_tracing, AppConfig};
use ariob_crypto::KdfParams;
use ariob_types::ErrorKind;
use pretty_assertions::assert_eq;
use std::io::Write;

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn defaults_match_component_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.adapter.ack_timeout_ms, 3_000);
    assert_eq!(config.adapter.settle_window_ms, 300);
    assert_eq!(config.freeze.list_timeout_ms, 300);
    assert_eq!(config.vault.namespace, "ariob_");
    assert_eq!(config.vault.session_timeout_ms, 12 * 60 * 60 * 1000);
    assert_eq!(config.kdf, KdfParams::default());
    assert!(config.storage_dir.is_none());
    assert!(config.log_filter.is_none());
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "adapter": {{ "ack_timeout_ms": 1500 }},
            "vault": {{ "namespace": "test_" }},
            "log_filter": "debug"
        }}"#
    )
    .unwrap();

    let config = AppConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.adapter.ack_timeout_ms, 1_500);
    assert_eq!(config.adapter.settle_window_ms, 300);
    assert_eq!(config.vault.namespace, "test_");
    assert!(config.vault.auto_logout_enabled);
    assert_eq!(config.log_filter.as_deref(), Some("debug"));
}

#[test]
fn config_survives_a_json_round_trip() {
    let config = AppConfig {
        kdf: KdfParams::fast(),
        storage_dir: Some("/var/lib/ariob".into()),
        ..AppConfig::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ariob.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(AppConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn missing_file_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn malformed_file_is_validation_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = AppConfig::from_json_file(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ── Logging ──────────────────────────────────────────────────────

#[test]
fn tracing_installs_once() {
    init_tracing(Some("warn"));
    assert!(!init_tracing(None));
}
