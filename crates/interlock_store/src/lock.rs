// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Lock store port and the record/lease vocabulary shared with the core crate.

use std::time::{Duration, SystemTime};

use crate::Result;

/// Time-to-live configuration for a lock.
///
/// A lock is either leased for a positive duration, after which it silently
/// expires, or it is [`Ttl::Unexpireable`] and must be released explicitly by
/// its owner (or force-released by anyone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ttl {
    /// The lock never expires on its own.
    Unexpireable,
    /// The lock expires after the given duration.
    For(Duration),
}

impl Ttl {
    /// Returns the lease duration, or `None` for an unexpireable lock.
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::Unexpireable => None,
            Self::For(duration) => Some(duration),
        }
    }

    /// Returns `true` if the lock never expires on its own.
    #[must_use]
    pub fn is_unexpireable(self) -> bool {
        matches!(self, Self::Unexpireable)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::For(duration)
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::Unexpireable, Self::For)
    }
}

/// Absolute expiry deadline of a stored lock record.
///
/// This is the record-side counterpart of [`Ttl`]: stores resolve a relative
/// lease duration against their clock when the record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expiry {
    /// The record never expires.
    Never,
    /// The record expires at the given instant.
    At(SystemTime),
}

impl Expiry {
    /// Resolves a lease duration against `now`.
    #[must_use]
    pub fn from_ttl(ttl: Ttl, now: SystemTime) -> Self {
        match ttl {
            Ttl::Unexpireable => Self::Never,
            Ttl::For(duration) => Self::At(now + duration),
        }
    }

    /// Returns `true` if the deadline has passed.
    ///
    /// An expired record must be treated as absent by every store operation
    /// and by every read through the port.
    #[must_use]
    pub fn is_expired(self, now: SystemTime) -> bool {
        match self {
            Self::Never => false,
            Self::At(deadline) => deadline <= now,
        }
    }

    /// Returns the time left until the deadline, or `None` when the record
    /// never expires.
    ///
    /// A deadline in the past yields `Some(Duration::ZERO)`.
    #[must_use]
    pub fn remaining(self, now: SystemTime) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::At(deadline) => Some(deadline.duration_since(now).unwrap_or(Duration::ZERO)),
        }
    }
}

/// A committed lock record as observed through [`LockStore::get_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// The owner that currently holds the lock.
    pub owner: String,
    /// When the record expires.
    pub expires_at: Expiry,
}

/// Trait for lock store implementations.
///
/// Implement this trait to persist lock records in a custom backend. The
/// mutual-exclusion guarantees of the lock handle rest entirely on the
/// atomicity of these operations; implementations must document the
/// guarantees they provide (e.g. `SET NX PX` for Redis, a conditional
/// `INSERT` for SQL, a mutex-guarded table for a single process).
///
/// # Contract
///
/// - Owner comparison is byte-exact string equality.
/// - A record whose deadline has passed is treated as absent by every
///   operation; stores may evict such records lazily.
/// - Re-acquisition by the current owner of a live record succeeds without
///   rewriting the expiry. This is a deliberate policy choice: a repeated
///   `try_insert` by the holder is a no-op, not a refresh.
#[cfg_attr(
    any(test, feature = "dynamic-store"),
    dynosaur::dynosaur(pub(crate) DynLockStore = dyn(box) LockStore, bridge(none))
)]
pub trait LockStore: Send + Sync {
    /// Atomically acquires the lock for `owner`.
    ///
    /// The write succeeds iff no live record exists, the existing record has
    /// expired, or the existing record's owner equals `owner`. Returns `true`
    /// when `owner` holds the lock after the call.
    fn try_insert(&self, key: &str, owner: &str, ttl: Ttl) -> impl Future<Output = Result<bool>> + Send;

    /// Removes the record iff a live record exists and is owned by `owner`.
    ///
    /// Returns `true` iff the record was removed.
    fn release(&self, key: &str, owner: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Removes the record regardless of owner.
    ///
    /// Returns `true` iff a live record existed before the call.
    fn force_release(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Moves the deadline of a live record to `now + new_ttl`.
    ///
    /// Returns `true` iff a live record exists, is owned by `owner`, and has
    /// a finite deadline. Refreshing an unexpireable record fails: there is
    /// no lease to extend.
    fn refresh(&self, key: &str, owner: &str, new_ttl: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Reads the most recent committed record, or `None` when no live record
    /// exists.
    fn get_record(&self, key: &str) -> impl Future<Output = Result<Option<LockRecord>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: SystemTime = SystemTime::UNIX_EPOCH;

    #[test]
    fn ttl_from_duration() {
        let ttl = Ttl::from(Duration::from_secs(5));
        assert_eq!(ttl, Ttl::For(Duration::from_secs(5)));
        assert_eq!(ttl.duration(), Some(Duration::from_secs(5)));
        assert!(!ttl.is_unexpireable());
    }

    #[test]
    fn ttl_from_option() {
        assert_eq!(Ttl::from(None), Ttl::Unexpireable);
        assert_eq!(Ttl::from(Some(Duration::from_secs(1))), Ttl::For(Duration::from_secs(1)));
        assert!(Ttl::Unexpireable.is_unexpireable());
        assert_eq!(Ttl::Unexpireable.duration(), None);
    }

    #[test]
    fn expiry_resolution() {
        assert_eq!(Expiry::from_ttl(Ttl::Unexpireable, NOW), Expiry::Never);
        assert_eq!(
            Expiry::from_ttl(Ttl::For(Duration::from_secs(3)), NOW),
            Expiry::At(NOW + Duration::from_secs(3))
        );
    }

    #[test]
    fn expiry_deadline_is_inclusive() {
        let deadline = NOW + Duration::from_secs(3);
        let expiry = Expiry::At(deadline);

        assert!(!expiry.is_expired(NOW));
        assert!(expiry.is_expired(deadline));
        assert!(expiry.is_expired(deadline + Duration::from_secs(1)));
        assert!(!Expiry::Never.is_expired(deadline));
    }

    #[test]
    fn expiry_remaining() {
        let deadline = NOW + Duration::from_secs(3);
        let expiry = Expiry::At(deadline);

        assert_eq!(expiry.remaining(NOW), Some(Duration::from_secs(3)));
        assert_eq!(expiry.remaining(deadline), Some(Duration::ZERO));
        assert_eq!(expiry.remaining(deadline + Duration::from_secs(1)), Some(Duration::ZERO));
        assert_eq!(Expiry::Never.remaining(NOW), None);
    }
}
