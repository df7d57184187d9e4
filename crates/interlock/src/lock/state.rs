// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::time::Duration;

/// The state of a lock as observed by one handle.
///
/// Derived from the stored record and the handle's owner id: a missing or
/// lapsed record is [`Expired`][Self::Expired]; a live record is either
/// [`Acquired`][Self::Acquired] (the handle's owner holds it) or
/// [`Unavailable`][Self::Unavailable] (a rival does).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No live record exists for the key.
    Expired,
    /// The handle's owner holds the lock.
    Acquired {
        /// Time left on the lease, or `None` for an unexpireable lock.
        remaining: Option<Duration>,
    },
    /// A rival owner holds the lock.
    Unavailable {
        /// The owner recorded on the backing store.
        owner: String,
    },
}

impl LockState {
    /// Returns `true` when the handle's owner holds the lock.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired { .. })
    }

    /// Returns `true` when no live record exists.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Returns `true` when a rival owner holds the lock.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        assert!(LockState::Expired.is_expired());
        assert!(LockState::Acquired { remaining: None }.is_acquired());
        assert!(
            LockState::Unavailable {
                owner: "rival".to_string()
            }
            .is_unavailable()
        );
        assert!(!LockState::Expired.is_acquired());
    }
}
