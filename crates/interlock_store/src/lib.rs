// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! State store ports for distributed locks and circuit breakers.
//!
//! This crate defines the narrow persistence interfaces that lock and
//! circuit-breaker handles consume:
//!
//! - [`LockStore`]: keyed lock records with atomic insert-if-absent,
//!   owner-gated release/refresh, and unconditional force-release.
//! - [`BreakerStore`]: keyed circuit state with rolling-window tracking and a
//!   single [`update_state`][BreakerStore::update_state] choke point for
//!   transitions.
//!
//! Store implementations are responsible for the atomicity of these
//! operations and must document the guarantees they provide. Handles never
//! attempt to synthesize atomicity above a non-atomic store.
//!
//! The `dynamic-store` feature (enabled by default) provides
//! [`DynamicLockStore`] and [`DynamicBreakerStore`], clonable type-erased
//! wrappers used by the core crate to hold any store implementation.
//!
//! The `test-util` feature provides [`testing::MockLockStore`] and
//! [`testing::MockBreakerStore`], operation-recording mocks with failure
//! injection for exercising error paths.

mod error;
pub use error::{Error, Result};

mod lock;
#[cfg(any(test, feature = "dynamic-store"))]
pub(crate) use lock::DynLockStore;
pub use lock::{Expiry, LockRecord, LockStore, Ttl};

mod breaker;
#[cfg(any(test, feature = "dynamic-store"))]
pub(crate) use breaker::DynBreakerStore;
pub use breaker::{BreakerState, BreakerStore, StateChange};

#[cfg(any(test, feature = "dynamic-store"))]
mod dynamic;
#[cfg(any(test, feature = "dynamic-store"))]
pub use dynamic::{DynamicBreakerStore, DynamicBreakerStoreExt, DynamicLockStore, DynamicLockStoreExt};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
