use ariob_crypto::{generate_random_key, open, seal, Sealed, NONCE_SIZE, TAG_SIZE};

fn tamper(sealed: Sealed, idx: usize) -> Sealed {
    let mut bytes = sealed.into_bytes();
    bytes[idx] ^= 0x01;
    Sealed::from_bytes(bytes).unwrap()
}

#[test]
fn seal_open_roundtrip() {
    let key = generate_random_key();
    let plaintext = b"{\"pub\":\"abc\"}";
    let sealed = seal(&key, plaintext).unwrap();
    assert_eq!(open(&key, &sealed).unwrap(), plaintext);
}

#[test]
fn seal_open_empty() {
    let key = generate_random_key();
    let sealed = seal(&key, b"").unwrap();
    assert_eq!(sealed.as_bytes().len(), NONCE_SIZE + TAG_SIZE);
    assert_eq!(sealed.plaintext_len(), 0);
    assert_eq!(open(&key, &sealed).unwrap(), b"");
}

#[test]
fn layout_is_nonce_body_tag() {
    let key = generate_random_key();
    let sealed = seal(&key, b"test").unwrap();
    assert_eq!(sealed.nonce().len(), NONCE_SIZE);
    assert_eq!(sealed.body().len(), 4 + TAG_SIZE);
    assert_eq!(sealed.plaintext_len(), 4);
    assert_eq!(&sealed.as_bytes()[..NONCE_SIZE], sealed.nonce());
}

#[test]
fn wrong_key_fails_to_open() {
    let sealed = seal(&generate_random_key(), b"Secret").unwrap();
    assert!(open(&generate_random_key(), &sealed).is_err());
}

#[test]
fn tampered_body_fails_to_open() {
    let key = generate_random_key();
    let sealed = seal(&key, b"Secret").unwrap();
    assert!(open(&key, &tamper(sealed, NONCE_SIZE)).is_err());
}

#[test]
fn tampered_nonce_fails_to_open() {
    let key = generate_random_key();
    let sealed = seal(&key, b"Secret").unwrap();
    assert!(open(&key, &tamper(sealed, 0)).is_err());
}

#[test]
fn tampered_tag_fails_to_open() {
    let key = generate_random_key();
    let sealed = seal(&key, b"Secret").unwrap();
    let last = sealed.as_bytes().len() - 1;
    assert!(open(&key, &tamper(sealed, last)).is_err());
}

#[test]
fn same_plaintext_seals_differently() {
    let key = generate_random_key();
    let a = seal(&key, b"Same").unwrap();
    let b = seal(&key, b"Same").unwrap();
    assert_ne!(a.nonce(), b.nonce());
    assert_ne!(a.body(), b.body());
}

#[test]
fn debug_shows_only_length() {
    let sealed = seal(&generate_random_key(), b"Secret").unwrap();
    assert_eq!(format!("{sealed:?}"), "Sealed { len: 34 }");
}

// ── Base64 form ──────────────────────────────────────────────────

#[test]
fn base64_roundtrip() {
    let key = generate_random_key();
    let sealed = seal(&key, b"record body").unwrap();
    let decoded = Sealed::from_base64(&sealed.to_base64()).unwrap();
    assert_eq!(decoded, sealed);
    assert_eq!(open(&key, &decoded).unwrap(), b"record body");
}

#[test]
fn base64_rejects_garbage() {
    assert!(Sealed::from_base64("not base64!!").is_err());
}

#[test]
fn short_records_are_rejected() {
    assert!(Sealed::from_bytes(vec![0u8; NONCE_SIZE + TAG_SIZE - 1]).is_err());
    assert!(Sealed::from_bytes(vec![0u8; NONCE_SIZE + TAG_SIZE]).is_ok());
}
