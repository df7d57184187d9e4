// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Distributed locks and circuit breakers with pluggable state stores.
//!
//! This crate provides two cooperating resilience primitives for in-process
//! and cross-process coordination:
//!
//! - [`Lock`]: a named, owner-scoped, leased mutual-exclusion handle that is
//!   safe across processes and machines.
//! - [`CircuitBreaker`]: a named failure-tracking state machine that
//!   short-circuits calls to degraded dependencies.
//!
//! Both are built from the same machinery:
//!
//! - **Store ports** ([`interlock_store`]): the minimal persistence
//!   operations a backend must provide. The in-memory reference stores live
//!   in `interlock_memory` (re-exported under the `memory` feature); SQL or
//!   Redis backends implement the same traits.
//! - **Providers** ([`LockProvider`], [`BreakerProvider`]): factories
//!   holding the shared collaborators and defaults, with keyspace
//!   [groups][LockProvider::with_group] to isolate independent use cases on
//!   one backing store.
//! - **Typed events** ([`LockEvent`], [`BreakerEvent`]): every lifecycle
//!   point is published on an [`EventBus`]; the library itself never logs.
//! - **Handle transport** ([`TransportRegistry`]): handles are value types
//!   and serialize to a compact identity payload, so a handle can cross a
//!   process boundary and rebind to the same shared state.
//!
//! # Runtime Agnostic Design
//!
//! All timing goes through [`tick::Clock`] and background work through
//! [`anyspawn::Spawner`], so the crate works on any async runtime and time
//! is fully controllable in tests.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use interlock::LockProvider;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let provider = LockProvider::builder(clock)
//!     .memory()
//!     .default_ttl(Duration::from_secs(30))
//!     .build();
//!
//! let lock = provider.lock("nightly-reindex").build();
//! if lock.acquire().await? {
//!     // ... exclusive work ...
//!     lock.release().await?;
//! }
//! # Ok::<(), interlock::StoreError>(())
//! # });
//! ```
//!
//! Circuit-breaking an unreliable dependency:
//!
//! ```
//! use std::time::Duration;
//!
//! use interlock::{BreakerError, BreakerProvider, Trigger};
//! use interlock_memory::BreakerPolicy;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let provider = BreakerProvider::builder(clock)
//!     .memory(BreakerPolicy::new())
//!     .trigger(Trigger::Both)
//!     .slow_call_time(Duration::from_millis(250))
//!     .build();
//!
//! let breaker = provider.breaker("billing").build();
//! match breaker.run(|| async { Ok::<_, std::io::Error>("charged") }).await {
//!     Ok(reply) => assert_eq!(reply, "charged"),
//!     Err(BreakerError::Open(_)) => { /* shed load */ }
//!     Err(error) => return Err(error.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `memory` *(default)*: enables the `.memory()` builder shortcuts backed
//!   by `interlock_memory`.
//! - `logs`: emits `tracing` events alongside the bus events.
//! - `test-util`: re-exports the mock stores of `interlock_store` and
//!   enables `tick`'s clock control.

pub mod breaker;
pub mod lock;

mod constants;

mod events;
pub use events::{EventBus, Listener, ListenerId, LocalBus, Subscription};

mod keyspace;
pub use keyspace::Keyspace;

mod retry;
pub use retry::RetryPolicy;

mod transport;
pub use transport::{TransportError, TransportRegistry, Transportable};

#[doc(inline)]
pub use breaker::{BreakerError, BreakerEvent, BreakerEventKind, BreakerProvider, CircuitBreaker, ErrorPolicy, Trigger};
#[doc(inline)]
pub use lock::{Lock, LockEvent, LockEventKind, LockProvider, LockState};

#[doc(inline)]
pub use interlock_store::{BreakerState, Error as StoreError, Expiry, LockRecord, StateChange, Ttl};

#[cfg(feature = "memory")]
#[doc(inline)]
pub use interlock_memory::{BreakerPolicy, MemoryBreakerStore, MemoryLockStore};

/// Mock stores for exercising error paths, re-exported from
/// [`interlock_store`].
#[cfg(feature = "test-util")]
pub mod testing {
    #[doc(inline)]
    pub use interlock_store::testing::{BreakerOp, LockOp, MockBreakerStore, MockLockStore};
}
