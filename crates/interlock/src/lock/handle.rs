// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use interlock_store::{DynamicLockStore, LockRecord, LockStore, Ttl};
use serde::{Deserialize, Serialize};
use tick::Clock;

use crate::events::EventBus;
use crate::lock::{
    AcquireError, KeyAlreadyAcquiredError, LockEvent, LockSnapshot, LockState, RefreshError, ReleaseError,
    UnownedRefreshError, UnownedReleaseError,
};
use crate::retry::{RetryPolicy, retry_until};
use crate::transport::{TransportError, Transportable};
use crate::StoreError;

/// Collaborators shared by every handle of one provider family.
pub(crate) struct LockRuntime {
    pub(crate) store: DynamicLockStore,
    pub(crate) bus: Arc<dyn EventBus<LockEvent>>,
    pub(crate) clock: Clock,
    pub(crate) transport_tag: Arc<str>,
}

impl std::fmt::Debug for LockRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockRuntime")
            .field("store", &self.store)
            .field("transport_tag", &self.transport_tag)
            .finish_non_exhaustive()
    }
}

/// Identity payload recorded when a handle is transported.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockTransport {
    pub(crate) key: String,
    pub(crate) owner: String,
    pub(crate) ttl: Ttl,
}

/// A per-key mutual-exclusion handle.
///
/// Created through [`LockProvider`][crate::LockProvider]. The handle is an
/// immutable value: `key`, `id` (the owner), and `ttl` never change after
/// construction; only the remote record mutates. Cloning is cheap and clones
/// observe the same shared record.
///
/// Every operation suspends on the store and publishes
/// [`LockEvent`]s on the provider's bus. The "try" forms (`acquire`,
/// `release`, `refresh`, ...) return booleans and raise only store errors;
/// the `*_or_fail` forms raise domain errors with the specific cause in the
/// error chain.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock::LockProvider;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let provider = LockProvider::builder(clock).memory().build();
///
/// let lock = provider.lock("billing").ttl(Duration::from_secs(30)).build();
/// assert!(lock.acquire().await?);
///
/// // A rival handle on the same key cannot get in.
/// let rival = provider.lock("billing").build();
/// assert!(!rival.acquire().await?);
///
/// assert!(lock.release().await?);
/// # Ok::<(), interlock::StoreError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Lock {
    runtime: Arc<LockRuntime>,
    key: String,
    owner: String,
    ttl: Ttl,
}

impl Lock {
    pub(crate) fn new(runtime: Arc<LockRuntime>, key: String, owner: String, ttl: Ttl) -> Self {
        Self { runtime, key, owner, ttl }
    }

    pub(crate) fn rehydrate(runtime: &Arc<LockRuntime>, data: LockTransport) -> Self {
        Self::new(Arc::clone(runtime), data.key, data.owner, data.ttl)
    }

    /// The decorated key identifying the shared record.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner id this handle proves ownership with.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.owner
    }

    /// The lease configuration used on acquisition.
    #[must_use]
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Attempts to acquire the lock.
    ///
    /// Returns `true` when this handle's owner holds the lock after the
    /// call: the record was absent, expired, or already owned by this owner.
    /// Re-acquisition of a live record by its owner succeeds without
    /// extending the lease.
    ///
    /// Publishes [`LockEvent::Acquired`] on success and
    /// [`LockEvent::Unavailable`] on failure.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn acquire(&self) -> Result<bool, StoreError> {
        let acquired = self.runtime.store.try_insert(&self.key, &self.owner, self.ttl).await?;

        #[cfg(feature = "logs")]
        tracing::trace!(key = %self.key, owner = %self.owner, acquired, "lock acquisition attempted");

        if acquired {
            self.dispatch(LockEvent::Acquired { lock: self.snapshot() });
        } else {
            self.dispatch(LockEvent::Unavailable { lock: self.snapshot() });
        }
        Ok(acquired)
    }

    /// Like [`acquire`][Self::acquire], but raises on failure.
    ///
    /// # Errors
    ///
    /// Raises [`AcquireError`] with a [`KeyAlreadyAcquiredError`] cause when
    /// a rival holds the lock, or with the store error as cause.
    pub async fn acquire_or_fail(&self) -> Result<(), AcquireError> {
        match self.acquire().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AcquireError::caused_by(
                self.key.clone(),
                KeyAlreadyAcquiredError::new(self.key.clone()),
            )),
            Err(error) => Err(AcquireError::caused_by(self.key.clone(), error)),
        }
    }

    /// Repeatedly attempts to acquire the lock until it succeeds or the
    /// policy's budget is exhausted.
    ///
    /// Each failed attempt publishes [`LockEvent::Unavailable`], so
    /// observers can count retry pressure. The sleep between attempts
    /// suspends on the provider's clock and exits promptly when the future
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails; the loop aborts
    /// on the first error.
    pub async fn acquire_blocking(&self, policy: RetryPolicy) -> Result<bool, StoreError> {
        retry_until(&self.runtime.clock, policy, || self.acquire()).await
    }

    /// Like [`acquire_blocking`][Self::acquire_blocking], but raises when the
    /// retry budget is exhausted.
    ///
    /// # Errors
    ///
    /// Raises [`AcquireError`] as [`acquire_or_fail`][Self::acquire_or_fail]
    /// does.
    pub async fn acquire_blocking_or_fail(&self, policy: RetryPolicy) -> Result<(), AcquireError> {
        match self.acquire_blocking(policy).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AcquireError::caused_by(
                self.key.clone(),
                KeyAlreadyAcquiredError::new(self.key.clone()),
            )),
            Err(error) => Err(AcquireError::caused_by(self.key.clone(), error)),
        }
    }

    /// Releases the lock if this handle's owner holds it.
    ///
    /// Returns `true` iff a live record owned by this handle existed and was
    /// removed. Publishes [`LockEvent::Released`] or
    /// [`LockEvent::ReleaseFailed`].
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn release(&self) -> Result<bool, StoreError> {
        let released = self.runtime.store.release(&self.key, &self.owner).await?;
        if released {
            self.dispatch(LockEvent::Released { lock: self.snapshot() });
        } else {
            self.dispatch(LockEvent::ReleaseFailed { lock: self.snapshot() });
        }
        Ok(released)
    }

    /// Like [`release`][Self::release], but raises on failure.
    ///
    /// # Errors
    ///
    /// Raises [`ReleaseError`] with an [`UnownedReleaseError`] cause when the
    /// caller is not the recorded owner, or with the store error as cause.
    pub async fn release_or_fail(&self) -> Result<(), ReleaseError> {
        match self.release().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ReleaseError::caused_by(
                self.key.clone(),
                UnownedReleaseError::new(self.key.clone()),
            )),
            Err(error) => Err(ReleaseError::caused_by(self.key.clone(), error)),
        }
    }

    /// Removes the record regardless of owner.
    ///
    /// Returns `true` iff a live record existed before the call. Publishes
    /// [`LockEvent::ForceReleased`] in both cases, with `has_released`
    /// reporting whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn force_release(&self) -> Result<bool, StoreError> {
        let has_released = self.runtime.store.force_release(&self.key).await?;
        self.dispatch(LockEvent::ForceReleased {
            lock: self.snapshot(),
            has_released,
        });
        Ok(has_released)
    }

    /// Moves the lease deadline to `now + new_ttl`.
    ///
    /// Returns `true` iff a live record exists, is owned by this handle, and
    /// carries a finite lease; refreshing an unexpireable or lapsed record
    /// fails. Publishes [`LockEvent::Refreshed`] or
    /// [`LockEvent::RefreshFailed`].
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn refresh(&self, new_ttl: Duration) -> Result<bool, StoreError> {
        let refreshed = self.runtime.store.refresh(&self.key, &self.owner, new_ttl).await?;
        if refreshed {
            self.dispatch(LockEvent::Refreshed {
                lock: self.snapshot(),
                ttl: new_ttl,
            });
        } else {
            self.dispatch(LockEvent::RefreshFailed { lock: self.snapshot() });
        }
        Ok(refreshed)
    }

    /// Like [`refresh`][Self::refresh], but raises on failure.
    ///
    /// # Errors
    ///
    /// Raises [`RefreshError`] with an [`UnownedRefreshError`] cause when the
    /// caller does not own a refreshable lease, or with the store error as
    /// cause.
    pub async fn refresh_or_fail(&self, new_ttl: Duration) -> Result<(), RefreshError> {
        match self.refresh(new_ttl).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RefreshError::caused_by(
                self.key.clone(),
                UnownedRefreshError::new(self.key.clone()),
            )),
            Err(error) => Err(RefreshError::caused_by(self.key.clone(), error)),
        }
    }

    /// Runs `f` inside the lock scope.
    ///
    /// Acquires with a single attempt, invokes `f` exactly once on success,
    /// and releases on every exit path, including a panicking `f` (the panic
    /// resumes after the release). A failed release is not surfaced (the
    /// scope's outcome dominates), though its event is still published.
    ///
    /// Dropping the returned future after `f` was entered skips the release;
    /// the lease then lapses by its ttl, or must be force-released. Prefer a
    /// finite ttl for work that may be cancelled.
    ///
    /// # Errors
    ///
    /// Raises [`AcquireError`] when the lock cannot be acquired; `f` is not
    /// invoked in that case.
    pub async fn run<T, F, Fut>(&self, f: F) -> Result<T, AcquireError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire_or_fail().await?;
        Ok(self.guarded(f).await)
    }

    /// Runs `f` inside the lock scope, waiting for the lock per `policy`.
    ///
    /// Identical to [`run`][Self::run] except the acquisition retries until
    /// the policy's budget is exhausted.
    ///
    /// # Errors
    ///
    /// Raises [`AcquireError`] when the lock cannot be acquired within the
    /// budget; `f` is not invoked in that case.
    pub async fn run_blocking<T, F, Fut>(&self, policy: RetryPolicy, f: F) -> Result<T, AcquireError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire_blocking_or_fail(policy).await?;
        Ok(self.guarded(f).await)
    }

    async fn guarded<T, F, Fut>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = AssertUnwindSafe(f()).catch_unwind().await;

        // The scope's outcome dominates: a failed release is swallowed, its
        // event has already been published by `release`.
        let _ = self.release().await;

        match outcome {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Returns the state of the lock as observed by this handle.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn state(&self) -> Result<LockState, StoreError> {
        let now = self.runtime.clock.system_time();
        match self.live_record().await? {
            None => Ok(LockState::Expired),
            Some(record) if record.owner == self.owner => Ok(LockState::Acquired {
                remaining: record.expires_at.remaining(now),
            }),
            Some(record) => Ok(LockState::Unavailable { owner: record.owner }),
        }
    }

    /// Returns `true` while any owner holds a live record for the key.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn is_locked(&self) -> Result<bool, StoreError> {
        Ok(self.live_record().await?.is_some())
    }

    /// Returns `true` when no live record exists for the key.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn is_expired(&self) -> Result<bool, StoreError> {
        Ok(self.live_record().await?.is_none())
    }

    /// Returns the time left on the current lease, regardless of holder.
    ///
    /// `None` when no live record exists or the record is unexpireable.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn remaining_time(&self) -> Result<Option<Duration>, StoreError> {
        let now = self.runtime.clock.system_time();
        Ok(self.live_record().await?.and_then(|record| record.expires_at.remaining(now)))
    }

    /// Returns the owner recorded on the backing store, if any.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn holder(&self) -> Result<Option<String>, StoreError> {
        Ok(self.live_record().await?.map(|record| record.owner))
    }

    /// Reads the record and re-applies the expiry check locally: a store may
    /// evict lazily, but an expired record must read as absent either way.
    async fn live_record(&self) -> Result<Option<LockRecord>, StoreError> {
        let now = self.runtime.clock.system_time();
        Ok(self
            .runtime
            .store
            .get_record(&self.key)
            .await?
            .filter(|record| !record.expires_at.is_expired(now)))
    }

    fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            key: self.key.clone(),
            owner: self.owner.clone(),
            ttl: self.ttl,
        }
    }

    fn dispatch(&self, event: LockEvent) {
        self.runtime.bus.dispatch(&event);
    }
}

impl Transportable for Lock {
    fn transport_tag(&self) -> &str {
        &self.runtime.transport_tag
    }

    fn transport_body(&self) -> Result<serde_json::Value, TransportError> {
        let data = LockTransport {
            key: self.key.clone(),
            owner: self.owner.clone(),
            ttl: self.ttl,
        };
        serde_json::to_value(&data).map_err(TransportError::from_message)
    }
}
