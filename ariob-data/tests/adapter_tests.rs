use ariob_crypto::KeyPair;
use ariob_data::{Adapter, AdapterConfig, GraphAdapter, MemoryAdapter, ScopedAdapter, WatchCallback};
use ariob_graph::{AckMode, GraphError, GraphStore, GraphUser, MemoryGraph, MemoryUser};
use ariob_types::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn recorder() -> (WatchCallback, Arc<Mutex<Vec<Option<Value>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: WatchCallback = Arc::new(move |value| sink.lock().unwrap().push(value));
    (callback, seen)
}

fn graph_adapter() -> (MemoryGraph, GraphAdapter) {
    let graph = MemoryGraph::new();
    let adapter = GraphAdapter::new(Arc::new(graph.clone()), AdapterConfig::default());
    (graph, adapter)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

// ── MemoryAdapter ────────────────────────────────────────────────

#[tokio::test]
async fn memory_put_get_remove() {
    let adapter = MemoryAdapter::new();
    assert_eq!(adapter.get("posts/1").await.unwrap(), None);

    let stored = adapter.put("posts/1", json!({"title": "a"})).await.unwrap();
    assert_eq!(stored, json!({"title": "a"}));
    assert_eq!(adapter.get("posts/1").await.unwrap(), Some(json!({"title": "a"})));

    assert!(adapter.remove("posts/1").await.unwrap());
    assert!(!adapter.remove("posts/1").await.unwrap());
    assert_eq!(adapter.get("posts/1").await.unwrap(), None);
}

#[tokio::test]
async fn memory_list_returns_direct_children_only() {
    let adapter = MemoryAdapter::new();
    adapter.put("posts/1", json!(1)).await.unwrap();
    adapter.put("posts/2", json!(2)).await.unwrap();
    adapter.put("posts/2/comments/1", json!(3)).await.unwrap();
    adapter.put("postscript/1", json!(4)).await.unwrap();

    assert_eq!(adapter.list("posts").await.unwrap(), vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn memory_watch_delivers_current_and_changes() {
    let adapter = MemoryAdapter::new();
    adapter.put("posts/1", json!("first")).await.unwrap();

    let (callback, seen) = recorder();
    let unsubscribe = adapter.watch("posts/1", callback);
    adapter.put("posts/1", json!("second")).await.unwrap();
    adapter.remove("posts/1").await.unwrap();
    unsubscribe();
    adapter.put("posts/1", json!("third")).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(json!("first")), Some(json!("second")), None]
    );
    assert_eq!(adapter.watcher_count(), 0);
}

// ── GraphAdapter writes ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn graph_put_then_get() {
    let (graph, adapter) = graph_adapter();
    adapter.put("posts/1", json!({"title": "a"})).await.unwrap();
    assert_eq!(graph.node("posts/1"), Some(json!({"title": "a"})));
    assert_eq!(adapter.get("posts/1").await.unwrap(), Some(json!({"title": "a"})));
}

#[tokio::test(start_paused = true)]
async fn graph_remove_writes_tombstone() {
    let (graph, adapter) = graph_adapter();
    adapter.put("posts/1", json!(1)).await.unwrap();
    assert!(adapter.remove("posts/1").await.unwrap());
    assert_eq!(graph.node("posts/1"), Some(Value::Null));
    assert_eq!(adapter.get("posts/1").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn silent_ack_succeeds_after_timeout() {
    let (graph, adapter) = graph_adapter();
    graph.set_ack_mode(AckMode::Silent);

    let start = Instant::now();
    adapter.put("posts/1", json!(1)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(3_000));

    // The late acknowledgment has nobody left to answer.
    assert_eq!(graph.release_held_acks(Err(GraphError::Rejected("late".into()))), 1);
    assert_eq!(graph.node("posts/1"), Some(json!(1)));
}

#[tokio::test(start_paused = true)]
async fn configured_ack_timeout_is_honoured() {
    let graph = MemoryGraph::new();
    graph.set_ack_mode(AckMode::Silent);
    let adapter = GraphAdapter::new(
        Arc::new(graph.clone()),
        AdapterConfig {
            ack_timeout_ms: 500,
            ..AdapterConfig::default()
        },
    );

    let start = Instant::now();
    adapter.remove("posts/1").await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(3_000));
}

#[tokio::test(start_paused = true)]
async fn rejected_ack_is_a_storage_error() {
    let (graph, adapter) = graph_adapter();
    graph.set_ack_mode(AckMode::Reject("disk full".into()));

    let err = adapter.put("posts/1", json!(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(err.cause.as_deref(), Some("disk full"));
    assert_eq!(graph.node("posts/1"), None);
}

#[tokio::test(start_paused = true)]
async fn dropped_ack_succeeds_without_waiting() {
    let (graph, adapter) = graph_adapter();
    graph.set_ack_mode(AckMode::Dropped);

    let start = Instant::now();
    adapter.put("posts/1", json!(1)).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(3_000));
}

#[tokio::test(start_paused = true)]
async fn delayed_ack_inside_timeout_is_used() {
    let (graph, adapter) = graph_adapter();
    graph.set_ack_mode(AckMode::Delayed(Duration::from_millis(1_000)));

    let start = Instant::now();
    adapter.put("posts/1", json!(1)).await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1_000));
    assert!(elapsed < Duration::from_millis(3_000));
}

#[tokio::test(start_paused = true)]
async fn slow_read_is_a_network_error() {
    let (graph, adapter) = graph_adapter();
    graph.set_read_delay(Duration::from_secs(10));
    let err = adapter.get("posts/1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

// ── GraphAdapter listing ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn list_skips_tombstones() {
    let (_, adapter) = graph_adapter();
    adapter.put("posts/1", json!(1)).await.unwrap();
    adapter.put("posts/2", json!(2)).await.unwrap();
    adapter.remove("posts/1").await.unwrap();

    assert_eq!(adapter.list("posts").await.unwrap(), vec![json!(2)]);
}

#[tokio::test(start_paused = true)]
async fn list_stops_at_settle_window() {
    let (graph, adapter) = graph_adapter();
    for i in 0..5 {
        graph.set_node(format!("posts/{i}"), json!(i));
    }
    graph.set_row_delay(Duration::from_millis(120));

    let start = Instant::now();
    let rows = adapter.list("posts").await.unwrap();
    assert_eq!(rows, vec![json!(0), json!(1)]);
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn list_returns_early_when_stream_ends() {
    let (graph, adapter) = graph_adapter();
    graph.set_node("posts/1", json!(1));

    let start = Instant::now();
    assert_eq!(adapter.list("posts").await.unwrap(), vec![json!(1)]);
    assert!(start.elapsed() < Duration::from_millis(300));
}

// ── GraphAdapter watch ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn graph_watch_stops_after_unsubscribe() {
    let (graph, adapter) = graph_adapter();
    let (callback, seen) = recorder();
    let unsubscribe = adapter.watch("posts/1", callback);
    assert_eq!(graph.listener_count(), 1);

    adapter.put("posts/1", json!(1)).await.unwrap();
    settle().await;
    unsubscribe();
    adapter.put("posts/1", json!(2)).await.unwrap();
    settle().await;

    assert_eq!(*seen.lock().unwrap(), vec![Some(json!(1))]);
    assert_eq!(graph.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn in_flight_delivery_after_unsubscribe_is_ignored() {
    let (graph, adapter) = graph_adapter();
    let (callback, seen) = recorder();
    let unsubscribe = adapter.watch("posts/1", callback);

    // The write schedules a delivery that has not run yet.
    drop(graph.put("posts/1", json!(1)));
    unsubscribe();
    settle().await;

    assert!(seen.lock().unwrap().is_empty());
}

// ── ScopedAdapter ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn scoped_requires_authentication() {
    let (_, inner) = graph_adapter();
    let scoped = ScopedAdapter::new(inner, Arc::new(MemoryUser::default()));

    assert_eq!(scoped.get("notes/1").await.unwrap_err().kind(), ErrorKind::Auth);
    assert_eq!(scoped.put("notes/1", json!(1)).await.unwrap_err().kind(), ErrorKind::Auth);
    assert_eq!(scoped.remove("notes/1").await.unwrap_err().kind(), ErrorKind::Auth);
    assert_eq!(scoped.list("notes").await.unwrap_err().kind(), ErrorKind::Auth);

    let (callback, seen) = recorder();
    scoped.watch("notes/1", callback)();
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scoped_writes_under_user_region() {
    let (graph, inner) = graph_adapter();
    let user = MemoryUser::default();
    let pair = KeyPair::generate();
    user.auth_pair(&pair).await.unwrap();
    let scoped = ScopedAdapter::new(inner.clone(), Arc::new(user.clone()));

    scoped.put("notes/1", json!("private")).await.unwrap();
    let path = format!("~{}/notes/1", pair.public);
    assert_eq!(graph.node(&path), Some(json!("private")));
    assert_eq!(scoped.get("notes/1").await.unwrap(), Some(json!("private")));
    assert_eq!(inner.get("notes/1").await.unwrap(), None);

    user.leave();
    assert!(scoped.get("notes/1").await.is_err());
}
