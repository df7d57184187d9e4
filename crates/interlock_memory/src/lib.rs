// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! In-memory state stores for distributed locks and circuit breakers.
//!
//! This crate provides the reference implementations of the
//! [`interlock_store`] ports:
//!
//! - [`MemoryLockStore`]: a mutex-guarded lock table with lazy expiry
//!   eviction.
//! - [`MemoryBreakerStore`]: a per-key circuit state machine with a sliding
//!   failure window, configured through [`BreakerPolicy`].
//!
//! Both stores take a [`tick::Clock`] so that expiry, sampling windows, and
//! cool-downs are fully controllable in tests.
//!
//! # Atomicity
//!
//! Every operation runs under a per-store mutex that is never held across an
//! await point, so each port operation is atomic with respect to all others
//! on the same store instance. The stores are process-local: handles in
//! different processes must share an external backend to coordinate.
//!
//! # Examples
//!
//! ```
//! use interlock_memory::MemoryLockStore;
//! use interlock_store::{LockStore, Ttl};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let store = MemoryLockStore::new(&clock);
//!
//! assert!(store.try_insert("jobs", "worker-1", Ttl::Unexpireable).await?);
//! assert!(!store.try_insert("jobs", "worker-2", Ttl::Unexpireable).await?);
//! # Ok::<(), interlock_store::Error>(())
//! # });
//! ```

mod lock;
pub use lock::MemoryLockStore;

mod breaker;
pub use breaker::{BreakerPolicy, MemoryBreakerStore};

mod window;
