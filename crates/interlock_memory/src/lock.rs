// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! In-memory lock table.

use std::collections::HashMap;
use std::time::Duration;

use interlock_store::{Expiry, LockRecord, LockStore, Result, Ttl};
use parking_lot::Mutex;
use tick::Clock;

/// An in-memory [`LockStore`] backed by a mutex-guarded table.
///
/// Expired records are treated as absent and evicted lazily: any operation
/// that observes an expired record removes it. Re-acquisition by the current
/// owner of a live record is a no-op that succeeds without rewriting the
/// expiry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock_memory::MemoryLockStore;
/// use interlock_store::{LockStore, Ttl};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let store = MemoryLockStore::new(&clock);
///
/// assert!(store.try_insert("jobs", "a", Ttl::For(Duration::from_secs(30))).await?);
/// assert!(store.release("jobs", "a").await?);
/// # Ok::<(), interlock_store::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryLockStore {
    clock: Clock,
    records: Mutex<HashMap<String, LockRecord>>,
}

impl MemoryLockStore {
    /// Creates an empty lock table driven by the given clock.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of live records in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.system_time();
        self.records.lock().values().filter(|r| !r.expires_at.is_expired(now)).count()
    }

    /// Returns `true` if the table holds no live records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockStore for MemoryLockStore {
    async fn try_insert(&self, key: &str, owner: &str, ttl: Ttl) -> Result<bool> {
        let now = self.clock.system_time();
        let mut records = self.records.lock();

        if let Some(record) = records.get(key)
            && !record.expires_at.is_expired(now)
        {
            // Live record: only the current owner "wins", and without a
            // fresh lease.
            return Ok(record.owner == owner);
        }

        records.insert(
            key.to_string(),
            LockRecord {
                owner: owner.to_string(),
                expires_at: Expiry::from_ttl(ttl, now),
            },
        );
        Ok(true)
    }

    async fn release(&self, key: &str, owner: &str) -> Result<bool> {
        let now = self.clock.system_time();
        let mut records = self.records.lock();

        match records.get(key) {
            Some(record) if record.expires_at.is_expired(now) => {
                records.remove(key);
                Ok(false)
            }
            Some(record) if record.owner == owner => {
                records.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn force_release(&self, key: &str) -> Result<bool> {
        let now = self.clock.system_time();
        let mut records = self.records.lock();

        match records.remove(key) {
            Some(record) => Ok(!record.expires_at.is_expired(now)),
            None => Ok(false),
        }
    }

    async fn refresh(&self, key: &str, owner: &str, new_ttl: Duration) -> Result<bool> {
        let now = self.clock.system_time();
        let mut records = self.records.lock();

        match records.get_mut(key) {
            Some(record) if record.expires_at.is_expired(now) => {
                records.remove(key);
                Ok(false)
            }
            Some(record) if record.owner == owner && record.expires_at != Expiry::Never => {
                record.expires_at = Expiry::At(now + new_ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_record(&self, key: &str) -> Result<Option<LockRecord>> {
        let now = self.clock.system_time();
        let mut records = self.records.lock();

        match records.get(key) {
            Some(record) if record.expires_at.is_expired(now) => {
                records.remove(key);
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }
}
