// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]
#![allow(clippy::unwrap_used, reason = "This is a test module")]

//! Integration tests for the in-memory lock store using only the public API.

use std::time::Duration;

use interlock_memory::MemoryLockStore;
use interlock_store::{Expiry, LockStore, Ttl};
use tick::ClockControl;

fn store_with_control() -> (MemoryLockStore, ClockControl) {
    let control = ClockControl::new();
    let store = MemoryLockStore::new(&control.to_clock());
    (store, control)
}

#[tokio::test]
async fn rival_owner_is_locked_out() {
    let (store, _control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::Unexpireable).await.unwrap());
    assert!(!store.try_insert("a", "c", Ttl::Unexpireable).await.unwrap());
    assert!(!store.release("a", "c").await.unwrap());
    assert!(store.release("a", "b").await.unwrap());
    assert!(store.try_insert("a", "c", Ttl::Unexpireable).await.unwrap());
}

#[tokio::test]
async fn reacquire_by_owner_does_not_extend_lease() {
    let (store, control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    control.advance(Duration::from_millis(30));

    // Re-acquire succeeds but must not rewrite the deadline.
    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    control.advance(Duration::from_millis(30));

    assert!(store.get_record("a").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_record_is_absent() {
    let (store, control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    assert!(store.get_record("a").await.unwrap().is_some());

    control.advance(Duration::from_millis(60));

    assert!(store.get_record("a").await.unwrap().is_none());
    // Any owner can take over once the lease lapsed.
    assert!(store.try_insert("a", "c", Ttl::Unexpireable).await.unwrap());
}

#[tokio::test]
async fn release_of_expired_record_fails() {
    let (store, control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    control.advance(Duration::from_millis(60));

    assert!(!store.release("a", "b").await.unwrap());
}

#[tokio::test]
async fn force_release_ignores_owner() {
    let (store, _control) = store_with_control();

    assert!(!store.force_release("a").await.unwrap());

    assert!(store.try_insert("a", "b", Ttl::Unexpireable).await.unwrap());
    assert!(store.force_release("a").await.unwrap());
    assert!(store.try_insert("a", "c", Ttl::Unexpireable).await.unwrap());
}

#[tokio::test]
async fn refresh_extends_lease() {
    let (store, control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    control.advance(Duration::from_millis(25));

    assert!(store.refresh("a", "b", Duration::from_millis(100)).await.unwrap());

    // Past the original deadline, still within the refreshed one.
    control.advance(Duration::from_millis(60));
    assert!(store.get_record("a").await.unwrap().is_some());

    control.advance(Duration::from_millis(60));
    assert!(store.get_record("a").await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_is_owner_gated() {
    let (store, _control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_secs(1))).await.unwrap());
    assert!(!store.refresh("a", "c", Duration::from_secs(2)).await.unwrap());
}

#[tokio::test]
async fn refresh_of_unexpireable_record_fails() {
    let (store, _control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::Unexpireable).await.unwrap());
    assert!(!store.refresh("a", "b", Duration::from_secs(1)).await.unwrap());
}

#[tokio::test]
async fn refresh_of_expired_record_fails() {
    let (store, control) = store_with_control();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    control.advance(Duration::from_millis(60));

    assert!(!store.refresh("a", "b", Duration::from_secs(1)).await.unwrap());
}

#[tokio::test]
async fn get_record_reports_owner_and_deadline() {
    let (store, control) = store_with_control();
    let start = control.to_clock().system_time();

    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_secs(2))).await.unwrap());

    let record = store.get_record("a").await.unwrap().expect("record must be live");
    assert_eq!(record.owner, "b");
    assert_eq!(record.expires_at, Expiry::At(start + Duration::from_secs(2)));

    assert!(store.try_insert("forever", "b", Ttl::Unexpireable).await.unwrap());
    let record = store.get_record("forever").await.unwrap().expect("record must be live");
    assert_eq!(record.expires_at, Expiry::Never);
}

#[tokio::test]
async fn len_counts_only_live_records() {
    let (store, control) = store_with_control();

    assert!(store.is_empty());
    assert!(store.try_insert("a", "b", Ttl::For(Duration::from_millis(50))).await.unwrap());
    assert!(store.try_insert("c", "d", Ttl::Unexpireable).await.unwrap());
    assert_eq!(store.len(), 2);

    control.advance(Duration::from_millis(60));
    assert_eq!(store.len(), 1);
}
