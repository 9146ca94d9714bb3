use ariob_data::{SubscriptionManager, Unsubscribe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counted(counter: &Arc<AtomicUsize>) -> Unsubscribe {
    let counter = Arc::clone(counter);
    Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

// ── Replacement ──────────────────────────────────────────────────

#[test]
fn re_adding_a_key_tears_down_the_previous_one() {
    let manager = SubscriptionManager::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    manager.add("posts/1", counted(&first));
    manager.add("posts/1", counted(&second));

    assert_eq!(manager.size(), 1);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn repeated_subscribe_never_accumulates() {
    let manager = SubscriptionManager::new();
    let torn = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        manager.add("posts/1", counted(&torn));
        assert_eq!(manager.size(), 1);
    }
    assert_eq!(torn.load(Ordering::SeqCst), 99);

    manager.cleanup();
    assert_eq!(manager.size(), 0);
    assert_eq!(torn.load(Ordering::SeqCst), 100);
}

#[test]
fn subscribe_unsubscribe_cycles_leave_nothing() {
    let manager = SubscriptionManager::new();
    let torn = Arc::new(AtomicUsize::new(0));
    for _ in 0..50 {
        manager.add("posts/1", counted(&torn));
        assert!(manager.remove("posts/1"));
        assert_eq!(manager.size(), 0);
    }
    assert_eq!(torn.load(Ordering::SeqCst), 50);
}

// ── Removal ──────────────────────────────────────────────────────

#[test]
fn remove_unknown_key_is_false() {
    assert!(!SubscriptionManager::new().remove("missing"));
}

#[test]
fn stale_token_does_not_remove_newer_subscription() {
    let manager = SubscriptionManager::new();
    let torn = Arc::new(AtomicUsize::new(0));
    let old = manager.add("posts/1", counted(&torn));
    let new = manager.add("posts/1", counted(&torn));

    assert!(!manager.remove_token("posts/1", old));
    assert!(manager.contains("posts/1"));
    assert!(manager.remove_token("posts/1", new));
    assert_eq!(torn.load(Ordering::SeqCst), 2);
}

#[test]
fn cleanup_tears_down_every_key() {
    let manager = SubscriptionManager::new();
    let torn = Arc::new(AtomicUsize::new(0));
    for i in 0..10 {
        manager.add(format!("posts/{i}"), counted(&torn));
    }
    assert_eq!(manager.size(), 10);

    manager.cleanup();
    assert_eq!(manager.size(), 0);
    assert_eq!(torn.load(Ordering::SeqCst), 10);
}

#[test]
fn teardown_may_reenter_the_manager() {
    let manager = SubscriptionManager::new();
    let inner = manager.clone();
    manager.add("a", Box::new(move || {
        inner.remove("b");
    }));
    manager.add("b", Box::new(|| {}));

    manager.remove("a");
    assert_eq!(manager.size(), 0);
}
