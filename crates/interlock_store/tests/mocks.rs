// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]
#![allow(clippy::unwrap_used, reason = "This is a test module")]
#![cfg(feature = "test-util")]

//! Integration tests for the mock stores using only the public API.

use std::time::Duration;

use interlock_store::testing::{BreakerOp, LockOp, MockBreakerStore, MockLockStore};
use interlock_store::{BreakerState, BreakerStore, LockStore, StateChange, Ttl};

#[tokio::test]
async fn mock_lock_store_gates_by_owner() {
    let store = MockLockStore::new();

    assert!(store.try_insert("k", "a", Ttl::Unexpireable).await.unwrap());
    assert!(!store.try_insert("k", "b", Ttl::Unexpireable).await.unwrap());
    // Same owner re-acquires.
    assert!(store.try_insert("k", "a", Ttl::Unexpireable).await.unwrap());

    assert!(!store.release("k", "b").await.unwrap());
    assert!(store.contains_key("k"));
    assert!(store.release("k", "a").await.unwrap());
    assert!(!store.contains_key("k"));
}

#[tokio::test]
async fn mock_lock_store_force_release_ignores_owner() {
    let store = MockLockStore::new();

    assert!(!store.force_release("k").await.unwrap());
    assert!(store.try_insert("k", "a", Ttl::Unexpireable).await.unwrap());
    assert!(store.force_release("k").await.unwrap());
    assert!(store.try_insert("k", "b", Ttl::Unexpireable).await.unwrap());
}

#[tokio::test]
async fn mock_lock_store_refresh_requires_finite_lease() {
    let store = MockLockStore::new();

    assert!(store.try_insert("k", "a", Ttl::Unexpireable).await.unwrap());
    assert!(!store.refresh("k", "a", Duration::from_secs(1)).await.unwrap());

    assert!(store.try_insert("leased", "a", Ttl::For(Duration::from_secs(1))).await.unwrap());
    assert!(store.refresh("leased", "a", Duration::from_secs(2)).await.unwrap());
    assert!(!store.refresh("leased", "b", Duration::from_secs(2)).await.unwrap());
}

#[tokio::test]
async fn mock_lock_store_records_operations() {
    let store = MockLockStore::new();

    let _acquired = store.try_insert("k", "a", Ttl::Unexpireable).await.unwrap();
    let _record = store.get_record("k").await.unwrap();

    assert_eq!(
        store.operations(),
        vec![
            LockOp::TryInsert {
                key: "k".into(),
                owner: "a".into(),
                ttl: Ttl::Unexpireable,
            },
            LockOp::GetRecord("k".into()),
        ]
    );
}

#[tokio::test]
async fn mock_lock_store_failure_injection() {
    let store = MockLockStore::new();
    store.fail_when(|op| matches!(op, LockOp::Release { .. }));

    assert!(store.try_insert("k", "a", Ttl::Unexpireable).await.is_ok());
    assert!(store.release("k", "a").await.is_err());

    store.clear_failures();
    assert!(store.release("k", "a").await.is_ok());
}

#[tokio::test]
async fn mock_breaker_store_defaults_to_closed() {
    let store = MockBreakerStore::new();

    assert_eq!(store.state("svc").await.unwrap(), BreakerState::Closed);

    let change = store.update_state("svc").await.unwrap();
    assert!(!change.transitioned());
}

#[tokio::test]
async fn mock_breaker_store_scripted_transitions() {
    let store = MockBreakerStore::new();
    store.push_change(
        "svc",
        StateChange {
            from: BreakerState::Closed,
            to: BreakerState::Open,
        },
    );

    let change = store.update_state("svc").await.unwrap();
    assert!(change.transitioned());
    assert_eq!(store.state("svc").await.unwrap(), BreakerState::Open);

    // Queue drained: subsequent evaluations are no-ops.
    let change = store.update_state("svc").await.unwrap();
    assert!(!change.transitioned());
}

#[tokio::test]
async fn mock_breaker_store_isolate_and_reset() {
    let store = MockBreakerStore::new();

    store.isolate("svc").await.unwrap();
    assert_eq!(store.state("svc").await.unwrap(), BreakerState::Isolated);

    store.reset("svc").await.unwrap();
    assert_eq!(store.state("svc").await.unwrap(), BreakerState::Closed);
}

#[tokio::test]
async fn mock_breaker_store_counts_tracking_ops() {
    let store = MockBreakerStore::new();

    store.track_success("svc").await.unwrap();
    store.track_failure("svc").await.unwrap();
    store.track_failure("svc").await.unwrap();

    assert_eq!(store.success_count("svc"), 1);
    assert_eq!(store.failure_count("svc"), 2);
    assert_eq!(
        store.operations(),
        vec![
            BreakerOp::TrackSuccess("svc".into()),
            BreakerOp::TrackFailure("svc".into()),
            BreakerOp::TrackFailure("svc".into()),
        ]
    );
}
