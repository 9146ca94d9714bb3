use ariob_model::{Schema, Thing, Validator};
use ariob_types::{ErrorKind, Issue, ManualClock};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl Schema for Post {
    const TYPE: &'static str = "post";

    fn validate(&self) -> Result<(), Vec<Issue>> {
        if self.title.is_empty() {
            Err(vec![Issue::new("/title", "must not be empty")])
        } else {
            Ok(())
        }
    }
}

fn post(title: &str) -> Post {
    Post {
        title: title.to_string(),
        tags: vec![],
    }
}

fn validator_at(now: i64) -> (Validator<Post>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    (Validator::new("posts", clock.clone()), clock)
}

fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("patch must be an object"),
    }
}

// ── prepare ──────────────────────────────────────────────────────

#[test]
fn prepare_assigns_meta_fields() {
    let (validator, _) = validator_at(1_000);
    let thing = validator.prepare(post("hello"), Some("alice-pub".into()));

    assert!(!thing.id.is_empty());
    assert_eq!(thing.soul, format!("posts/{}", thing.id));
    assert_eq!(thing.schema, "post");
    assert_eq!(thing.created_at, 1_000);
    assert_eq!(thing.updated_at, 1_000);
    assert!(thing.public);
    assert_eq!(thing.created_by.as_deref(), Some("alice-pub"));
}

#[test]
fn prepare_generates_distinct_ids() {
    let (validator, _) = validator_at(0);
    let a = validator.prepare(post("a"), None);
    let b = validator.prepare(post("b"), None);
    assert_ne!(a.id, b.id);
}

#[test]
fn prepare_with_id_uses_given_id() {
    let (validator, _) = validator_at(0);
    let thing = validator.prepare_with_id("fixed", post("a"), None);
    assert_eq!(thing.soul, "posts/fixed");
}

// ── check ────────────────────────────────────────────────────────

#[test]
fn check_accepts_prepared_json() {
    let (validator, _) = validator_at(5);
    let thing = validator.prepare(post("hello"), None);
    let value = serde_json::to_value(&thing).unwrap();
    assert_eq!(validator.check(value).unwrap(), thing);
}

#[test]
fn wire_form_is_flat_camel_case() {
    let (validator, _) = validator_at(5);
    let thing = validator.prepare_with_id("p1", post("hello"), None);
    let value = serde_json::to_value(&thing).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "p1",
            "soul": "posts/p1",
            "schema": "post",
            "createdAt": 5,
            "updatedAt": 5,
            "public": true,
            "title": "hello",
            "tags": []
        })
    );
}

#[test]
fn check_rejects_missing_field() {
    let (validator, _) = validator_at(0);
    let err = validator
        .check(json!({"id": "x", "soul": "posts/x", "schema": "post", "createdAt": 0, "updatedAt": 0}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn check_rejects_wrong_schema_tag() {
    let (validator, _) = validator_at(0);
    let err = validator
        .check(json!({"id": "x", "soul": "posts/x", "schema": "note", "createdAt": 0, "updatedAt": 0, "title": "t"}))
        .unwrap_err();
    assert!(err.issues.iter().any(|i| i.path == "/schema"));
}

#[test]
fn check_rejects_foreign_soul() {
    let (validator, _) = validator_at(0);
    let err = validator
        .check(json!({"id": "x", "soul": "other/x", "schema": "post", "createdAt": 0, "updatedAt": 0, "title": "t"}))
        .unwrap_err();
    assert!(err.issues.iter().any(|i| i.path == "/soul"));
}

#[test]
fn check_collects_payload_issues() {
    let (validator, _) = validator_at(0);
    let err = validator
        .check(json!({"id": "x", "soul": "posts/x", "schema": "post", "createdAt": 0, "updatedAt": 0, "title": ""}))
        .unwrap_err();
    assert_eq!(err.issues, vec![Issue::new("/title", "must not be empty")]);
}

#[test]
fn public_defaults_to_true_when_absent() {
    let (validator, _) = validator_at(0);
    let thing: Thing<Post> = validator
        .check(json!({"id": "x", "soul": "posts/x", "schema": "post", "createdAt": 0, "updatedAt": 0, "title": "t"}))
        .unwrap();
    assert!(thing.public);
}

// ── merge ────────────────────────────────────────────────────────

#[test]
fn merge_overwrites_only_patched_fields() {
    let (validator, clock) = validator_at(100);
    let mut current = validator.prepare(post("first"), None);
    current.data.tags = vec!["rust".into()];
    clock.advance(50);

    let merged = validator
        .merge(&current, &patch(json!({"title": "second"})))
        .unwrap();

    assert_eq!(merged.data.title, "second");
    assert_eq!(merged.data.tags, vec!["rust".to_string()]);
    assert_eq!(merged.id, current.id);
    assert_eq!(merged.created_at, 100);
    assert_eq!(merged.updated_at, 150);
}

#[test]
fn merge_bumps_updated_at_when_clock_stalls() {
    let (validator, _) = validator_at(100);
    let current = validator.prepare(post("first"), None);
    let merged = validator
        .merge(&current, &patch(json!({"title": "again"})))
        .unwrap();
    assert_eq!(merged.updated_at, 101);
}

#[test]
fn merge_rejects_protected_fields() {
    let (validator, _) = validator_at(0);
    let current = validator.prepare(post("first"), None);
    for field in ["id", "soul", "schema", "createdAt"] {
        let mut p = Map::new();
        p.insert(field.to_string(), json!("x"));
        let err = validator.merge(&current, &p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "field {field}");
    }
}

#[test]
fn merge_revalidates_whole_entity() {
    let (validator, _) = validator_at(0);
    let current = validator.prepare(post("first"), None);
    let err = validator
        .merge(&current, &patch(json!({"title": ""})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = validator
        .merge(&current, &patch(json!({"tags": "not-a-list"})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
