// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]
#![allow(clippy::unwrap_used, reason = "This is a test module")]

//! Integration tests for handle transport using only the public API.

use std::time::Duration;

use interlock::{BreakerProvider, CircuitBreaker, Lock, LockProvider, LockState, TransportRegistry, Trigger, Ttl};
use interlock_memory::{BreakerPolicy, MemoryBreakerStore, MemoryLockStore};
use interlock_store::{DynamicBreakerStore, DynamicLockStore};
use tick::ClockControl;

#[tokio::test]
async fn lock_round_trips_through_bytes() {
    let control = ClockControl::new();
    let registry = TransportRegistry::new();
    let provider = LockProvider::builder(control.to_clock()).memory().build();
    provider.bind_transport(&registry).unwrap();

    let lock = provider.lock("jobs").owner("me").ttl(Duration::from_secs(10)).build();
    assert!(lock.acquire().await.unwrap());

    let bytes = registry.serialize(&lock).unwrap();
    let restored: Lock = registry.deserialize(&bytes).unwrap();

    // Identity survives the round trip.
    assert_eq!(restored.key(), lock.key());
    assert_eq!(restored.id(), lock.id());
    assert_eq!(restored.ttl(), lock.ttl());

    // The restored handle controls the same shared record.
    assert!(restored.is_locked().await.unwrap());
    assert_eq!(
        restored.state().await.unwrap(),
        LockState::Acquired {
            remaining: Some(Duration::from_secs(10))
        }
    );
    assert!(restored.release().await.unwrap());
    assert!(!lock.is_locked().await.unwrap());
}

#[tokio::test]
async fn lock_rehydrates_against_the_deserializing_process() {
    let control = ClockControl::new();
    let clock = control.to_clock();

    // Two "processes" sharing one backing store.
    let shared_store = DynamicLockStore::new(MemoryLockStore::new(&clock));
    let sender = LockProvider::builder(clock.clone()).storage(shared_store.clone()).build();
    let receiver = LockProvider::builder(clock).storage(shared_store).build();

    let sender_registry = TransportRegistry::new();
    sender.bind_transport(&sender_registry).unwrap();
    let receiver_registry = TransportRegistry::new();
    receiver.bind_transport(&receiver_registry).unwrap();

    let lock = sender.lock("jobs").owner("me").build();
    assert!(lock.acquire().await.unwrap());

    let bytes = sender_registry.serialize(&lock).unwrap();
    let restored: Lock = receiver_registry.deserialize(&bytes).unwrap();

    // Rebound to the receiver's collaborators, same shared state.
    assert_eq!(restored.holder().await.unwrap(), Some("me".to_string()));
    assert!(restored.release().await.unwrap());
    assert!(!lock.is_locked().await.unwrap());
}

#[tokio::test]
async fn deserialized_handle_reads_state_on_demand() {
    let control = ClockControl::new();
    let registry = TransportRegistry::new();
    let provider = LockProvider::builder(control.to_clock()).memory().build();
    provider.bind_transport(&registry).unwrap();

    let lock = provider.lock("jobs").ttl(Duration::from_millis(50)).build();
    assert!(lock.acquire().await.unwrap());
    let bytes = registry.serialize(&lock).unwrap();

    // The payload captures identity, not live state: changes after
    // serialization are visible through the restored handle.
    control.advance(Duration::from_millis(60));
    let restored: Lock = registry.deserialize(&bytes).unwrap();
    assert!(restored.is_expired().await.unwrap());
}

#[tokio::test]
async fn breaker_round_trips_through_bytes() {
    let control = ClockControl::new();
    let clock = control.to_clock();

    let shared_store = DynamicBreakerStore::new(MemoryBreakerStore::new(&clock, BreakerPolicy::new()));
    let sender = BreakerProvider::builder(clock.clone())
        .storage(shared_store.clone())
        .trigger(Trigger::OnlySlowCall)
        .slow_call_time(Duration::from_millis(250))
        .build();
    let receiver = BreakerProvider::builder(clock).storage(shared_store).build();

    let sender_registry = TransportRegistry::new();
    sender.bind_transport(&sender_registry).unwrap();
    let receiver_registry = TransportRegistry::new();
    receiver.bind_transport(&receiver_registry).unwrap();

    let breaker = sender.breaker("billing").build();
    breaker.isolate().await.unwrap();

    let bytes = sender_registry.serialize(&breaker).unwrap();
    let restored: CircuitBreaker = receiver_registry.deserialize(&bytes).unwrap();

    // Policy configuration travels; state is observed from the shared store.
    assert_eq!(restored.key(), breaker.key());
    assert_eq!(restored.trigger(), Trigger::OnlySlowCall);
    assert_eq!(restored.slow_call_time(), Some(Duration::from_millis(250)));
    assert_eq!(restored.state().await.unwrap(), interlock::BreakerState::Isolated);
}

#[tokio::test]
async fn tag_collision_is_a_configuration_error() {
    let control = ClockControl::new();
    let clock = control.to_clock();
    let registry = TransportRegistry::new();

    let first = LockProvider::builder(clock.clone()).memory().build();
    first.bind_transport(&registry).unwrap();

    // A second family with the default tag collides...
    let second = LockProvider::builder(clock.clone()).memory().build();
    assert!(second.bind_transport(&registry).is_err());

    // ...until its tag is overridden.
    let disambiguated = LockProvider::builder(clock).memory().transport_tag("app/other-lock").build();
    disambiguated.bind_transport(&registry).unwrap();
}

#[tokio::test]
async fn group_handles_round_trip_under_the_family_tag() {
    let control = ClockControl::new();
    let registry = TransportRegistry::new();
    let provider = LockProvider::builder(control.to_clock()).memory().build();
    provider.bind_transport(&registry).unwrap();

    let tenants = provider.with_group("tenant-1");
    let lock = tenants.lock("jobs").owner("me").build();
    assert!(lock.acquire().await.unwrap());

    let bytes = registry.serialize(&lock).unwrap();
    let restored: Lock = registry.deserialize(&bytes).unwrap();

    // The decorated key is captured verbatim; no double decoration.
    assert_eq!(restored.key(), lock.key());
    assert!(restored.is_locked().await.unwrap());
}

#[tokio::test]
async fn unknown_tag_fails_deserialization() {
    let control = ClockControl::new();
    let provider = LockProvider::builder(control.to_clock()).memory().build();

    let sender_registry = TransportRegistry::new();
    provider.bind_transport(&sender_registry).unwrap();

    let lock = provider.lock("jobs").build();
    let bytes = sender_registry.serialize(&lock).unwrap();

    // A registry that never learned the tag cannot rebuild the handle.
    let empty_registry = TransportRegistry::new();
    let result: Result<Lock, _> = empty_registry.deserialize(&bytes);
    assert!(result.is_err());
}

#[tokio::test]
async fn transported_ttl_survives_as_configuration() {
    let control = ClockControl::new();
    let registry = TransportRegistry::new();
    let provider = LockProvider::builder(control.to_clock()).memory().build();
    provider.bind_transport(&registry).unwrap();

    let unexpireable = provider.lock("forever").build();
    let bytes = registry.serialize(&unexpireable).unwrap();
    let restored: Lock = registry.deserialize(&bytes).unwrap();
    assert_eq!(restored.ttl(), Ttl::Unexpireable);
}
