// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Type-erased store wrappers.
//!
//! Providers hold stores behind these wrappers so that a single provider type
//! can work with any store implementation while remaining cheaply clonable.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::{BreakerState, BreakerStore, DynBreakerStore, DynLockStore, LockRecord, LockStore, Result, StateChange, Ttl};

/// Extension trait for converting any [`LockStore`] into a [`DynamicLockStore`].
///
/// This trait is automatically implemented for all types that implement
/// `LockStore`.
pub trait DynamicLockStoreExt: Sized {
    /// Converts this store into a [`DynamicLockStore`].
    fn into_dynamic(self) -> DynamicLockStore;
}

impl<S> DynamicLockStoreExt for S
where
    S: LockStore + 'static,
{
    fn into_dynamic(self) -> DynamicLockStore {
        DynamicLockStore::new(self)
    }
}

/// A clonable lock store with type erasure.
///
/// `DynamicLockStore` wraps a trait object in an `Arc` to enable cloning
/// while maintaining dynamic dispatch.
pub struct DynamicLockStore(Arc<DynLockStore<'static>>);

impl DynamicLockStore {
    /// Creates a new dynamic store from any [`LockStore`] implementation.
    pub fn new<S>(store: S) -> Self
    where
        S: LockStore + Send + Sync + 'static,
    {
        Self(DynLockStore::new_arc(store))
    }
}

impl Debug for DynamicLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicLockStore").finish()
    }
}

impl Clone for DynamicLockStore {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl LockStore for DynamicLockStore {
    async fn try_insert(&self, key: &str, owner: &str, ttl: Ttl) -> Result<bool> {
        self.0.try_insert(key, owner, ttl).await
    }

    async fn release(&self, key: &str, owner: &str) -> Result<bool> {
        self.0.release(key, owner).await
    }

    async fn force_release(&self, key: &str) -> Result<bool> {
        self.0.force_release(key).await
    }

    async fn refresh(&self, key: &str, owner: &str, new_ttl: Duration) -> Result<bool> {
        self.0.refresh(key, owner, new_ttl).await
    }

    async fn get_record(&self, key: &str) -> Result<Option<LockRecord>> {
        self.0.get_record(key).await
    }
}

/// Extension trait for converting any [`BreakerStore`] into a
/// [`DynamicBreakerStore`].
pub trait DynamicBreakerStoreExt: Sized {
    /// Converts this store into a [`DynamicBreakerStore`].
    fn into_dynamic(self) -> DynamicBreakerStore;
}

impl<S> DynamicBreakerStoreExt for S
where
    S: BreakerStore + 'static,
{
    fn into_dynamic(self) -> DynamicBreakerStore {
        DynamicBreakerStore::new(self)
    }
}

/// A clonable breaker store with type erasure.
pub struct DynamicBreakerStore(Arc<DynBreakerStore<'static>>);

impl DynamicBreakerStore {
    /// Creates a new dynamic store from any [`BreakerStore`] implementation.
    pub fn new<S>(store: S) -> Self
    where
        S: BreakerStore + Send + Sync + 'static,
    {
        Self(DynBreakerStore::new_arc(store))
    }
}

impl Debug for DynamicBreakerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicBreakerStore").finish()
    }
}

impl Clone for DynamicBreakerStore {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl BreakerStore for DynamicBreakerStore {
    async fn state(&self, key: &str) -> Result<BreakerState> {
        self.0.state(key).await
    }

    async fn update_state(&self, key: &str) -> Result<StateChange> {
        self.0.update_state(key).await
    }

    async fn track_success(&self, key: &str) -> Result<()> {
        self.0.track_success(key).await
    }

    async fn track_failure(&self, key: &str) -> Result<()> {
        self.0.track_failure(key).await
    }

    async fn isolate(&self, key: &str) -> Result<()> {
        self.0.isolate(key).await
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.0.reset(key).await
    }
}
