// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Mock store implementations for testing.
//!
//! This module provides [`MockLockStore`] and [`MockBreakerStore`],
//! configurable in-memory stores that record every operation and support
//! failure injection for testing error paths.
//!
//! The mocks are mechanical: they do not model time, so lease expiry and the
//! breaker transition rules are not evaluated here. Use a real store (such as
//! the `interlock_memory` crate) to exercise time-dependent behavior; use the
//! mocks to verify which operations a handle issued and how it reacts when
//! they fail.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{BreakerState, BreakerStore, Error, Expiry, LockRecord, LockStore, Result, StateChange, Ttl};

/// Recorded lock store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOp {
    /// A `try_insert` operation was performed.
    TryInsert {
        /// The key that was acquired.
        key: String,
        /// The owner that requested the acquisition.
        owner: String,
        /// The requested lease.
        ttl: Ttl,
    },
    /// A `release` operation was performed.
    Release {
        /// The key that was released.
        key: String,
        /// The owner that requested the release.
        owner: String,
    },
    /// A `force_release` operation was performed with the given key.
    ForceRelease(String),
    /// A `refresh` operation was performed.
    Refresh {
        /// The key that was refreshed.
        key: String,
        /// The owner that requested the refresh.
        owner: String,
        /// The new lease duration.
        new_ttl: Duration,
    },
    /// A `get_record` operation was performed with the given key.
    GetRecord(String),
}

type FailLockPredicate = Box<dyn Fn(&LockOp) -> bool + Send + Sync>;

/// A configurable mock lock store for testing.
///
/// Records every operation for later verification and can be configured to
/// fail operations on demand. Ownership gating is modeled (a rival owner
/// cannot acquire, release, or refresh), but expiry is not: every record is
/// treated as live until released.
///
/// # Examples
///
/// ```no_run
/// use interlock_store::testing::{LockOp, MockLockStore};
/// use interlock_store::{LockStore, Ttl};
///
/// # async fn example() {
/// let store = MockLockStore::new();
///
/// assert!(store.try_insert("jobs", "a", Ttl::Unexpireable).await.unwrap());
/// assert!(!store.try_insert("jobs", "b", Ttl::Unexpireable).await.unwrap());
///
/// assert_eq!(
///     store.operations(),
///     vec![
///         LockOp::TryInsert { key: "jobs".into(), owner: "a".into(), ttl: Ttl::Unexpireable },
///         LockOp::TryInsert { key: "jobs".into(), owner: "b".into(), ttl: Ttl::Unexpireable },
///     ]
/// );
/// # }
/// ```
///
/// # Failure Injection
///
/// ```no_run
/// use interlock_store::testing::{LockOp, MockLockStore};
/// use interlock_store::{LockStore, Ttl};
///
/// # async fn example() {
/// let store = MockLockStore::new();
///
/// store.fail_when(|op| matches!(op, LockOp::Release { .. }));
/// assert!(store.try_insert("jobs", "a", Ttl::Unexpireable).await.is_ok());
/// assert!(store.release("jobs", "a").await.is_err());
/// # }
/// ```
pub struct MockLockStore {
    records: Arc<Mutex<HashMap<String, LockRecord>>>,
    operations: Arc<Mutex<Vec<LockOp>>>,
    fail_when: Arc<Mutex<Option<FailLockPredicate>>>,
}

impl std::fmt::Debug for MockLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLockStore")
            .field("records", &self.records)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockLockStore {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockLockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLockStore {
    /// Creates a new empty mock lock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns `true` if a record exists for the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.records.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should
    /// fail with a store [`Error`].
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&LockOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<LockOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: LockOp) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &LockOp) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn check(&self, op: LockOp) -> Result<()> {
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: operation failed"));
        }
        Ok(())
    }
}

impl LockStore for MockLockStore {
    async fn try_insert(&self, key: &str, owner: &str, ttl: Ttl) -> Result<bool> {
        self.check(LockOp::TryInsert {
            key: key.to_string(),
            owner: owner.to_string(),
            ttl,
        })?;

        let mut records = self.records.lock();
        match records.get(key) {
            Some(record) => Ok(record.owner == owner),
            None => {
                let expires_at = match ttl {
                    Ttl::Unexpireable => Expiry::Never,
                    Ttl::For(duration) => Expiry::At(std::time::SystemTime::UNIX_EPOCH + duration),
                };
                records.insert(
                    key.to_string(),
                    LockRecord {
                        owner: owner.to_string(),
                        expires_at,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str, owner: &str) -> Result<bool> {
        self.check(LockOp::Release {
            key: key.to_string(),
            owner: owner.to_string(),
        })?;

        let mut records = self.records.lock();
        if records.get(key).is_some_and(|record| record.owner == owner) {
            records.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn force_release(&self, key: &str) -> Result<bool> {
        self.check(LockOp::ForceRelease(key.to_string()))?;
        Ok(self.records.lock().remove(key).is_some())
    }

    async fn refresh(&self, key: &str, owner: &str, new_ttl: Duration) -> Result<bool> {
        self.check(LockOp::Refresh {
            key: key.to_string(),
            owner: owner.to_string(),
            new_ttl,
        })?;

        let mut records = self.records.lock();
        match records.get_mut(key) {
            Some(record) if record.owner == owner && record.expires_at != Expiry::Never => {
                record.expires_at = Expiry::At(std::time::SystemTime::UNIX_EPOCH + new_ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_record(&self, key: &str) -> Result<Option<LockRecord>> {
        self.check(LockOp::GetRecord(key.to_string()))?;
        Ok(self.records.lock().get(key).cloned())
    }
}

/// Recorded breaker store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerOp {
    /// A `state` read was performed with the given key.
    State(String),
    /// An `update_state` evaluation was performed with the given key.
    UpdateState(String),
    /// A `track_success` operation was performed with the given key.
    TrackSuccess(String),
    /// A `track_failure` operation was performed with the given key.
    TrackFailure(String),
    /// An `isolate` operation was performed with the given key.
    Isolate(String),
    /// A `reset` operation was performed with the given key.
    Reset(String),
}

type FailBreakerPredicate = Box<dyn Fn(&BreakerOp) -> bool + Send + Sync>;

/// A configurable mock breaker store for testing.
///
/// Records every operation and supports failure injection like
/// [`MockLockStore`]. The transition rules are not modeled; instead tests
/// script them explicitly:
///
/// - [`set_state`][Self::set_state] pins the current state of a key;
/// - [`push_change`][Self::push_change] enqueues the outcome of the next
///   `update_state` call (subsequent calls without a queued outcome report
///   `{current, current}`).
pub struct MockBreakerStore {
    states: Arc<Mutex<HashMap<String, BreakerState>>>,
    queued: Arc<Mutex<HashMap<String, VecDeque<StateChange>>>>,
    operations: Arc<Mutex<Vec<BreakerOp>>>,
    fail_when: Arc<Mutex<Option<FailBreakerPredicate>>>,
}

impl std::fmt::Debug for MockBreakerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBreakerStore")
            .field("states", &self.states)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockBreakerStore {
    fn clone(&self) -> Self {
        Self {
            states: Arc::clone(&self.states),
            queued: Arc::clone(&self.queued),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockBreakerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBreakerStore {
    /// Creates a new mock breaker store; every key starts `Closed`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Pins the current state of a key.
    pub fn set_state(&self, key: &str, state: BreakerState) {
        self.states.lock().insert(key.to_string(), state);
    }

    /// Enqueues the outcome of the next `update_state` call for a key.
    ///
    /// The `to` state becomes the key's current state when the queued change
    /// is consumed.
    pub fn push_change(&self, key: &str, change: StateChange) {
        self.queued.lock().entry(key.to_string()).or_default().push_back(change);
    }

    /// Sets a predicate that determines when operations should fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BreakerOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BreakerOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns the number of tracked successes recorded for a key.
    #[must_use]
    pub fn success_count(&self, key: &str) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, BreakerOp::TrackSuccess(k) if k == key))
            .count()
    }

    /// Returns the number of tracked failures recorded for a key.
    #[must_use]
    pub fn failure_count(&self, key: &str) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, BreakerOp::TrackFailure(k) if k == key))
            .count()
    }

    fn record(&self, op: BreakerOp) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &BreakerOp) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn check(&self, op: BreakerOp) -> Result<()> {
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: operation failed"));
        }
        Ok(())
    }

    fn current(&self, key: &str) -> BreakerState {
        self.states.lock().get(key).copied().unwrap_or(BreakerState::Closed)
    }
}

impl BreakerStore for MockBreakerStore {
    async fn state(&self, key: &str) -> Result<BreakerState> {
        self.check(BreakerOp::State(key.to_string()))?;
        Ok(self.current(key))
    }

    async fn update_state(&self, key: &str) -> Result<StateChange> {
        self.check(BreakerOp::UpdateState(key.to_string()))?;

        let queued = self.queued.lock().get_mut(key).and_then(VecDeque::pop_front);
        match queued {
            Some(change) => {
                self.states.lock().insert(key.to_string(), change.to);
                Ok(change)
            }
            None => {
                let current = self.current(key);
                Ok(StateChange {
                    from: current,
                    to: current,
                })
            }
        }
    }

    async fn track_success(&self, key: &str) -> Result<()> {
        self.check(BreakerOp::TrackSuccess(key.to_string()))
    }

    async fn track_failure(&self, key: &str) -> Result<()> {
        self.check(BreakerOp::TrackFailure(key.to_string()))
    }

    async fn isolate(&self, key: &str) -> Result<()> {
        self.check(BreakerOp::Isolate(key.to_string()))?;
        self.states.lock().insert(key.to_string(), BreakerState::Isolated);
        Ok(())
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.check(BreakerOp::Reset(key.to_string()))?;
        self.states.lock().insert(key.to_string(), BreakerState::Closed);
        self.queued.lock().remove(key);
        Ok(())
    }
}
