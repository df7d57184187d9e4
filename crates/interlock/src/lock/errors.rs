// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Lock domain errors.
//!
//! The `*_or_fail` methods raise the coarse surfaces ([`AcquireError`],
//! [`ReleaseError`], [`RefreshError`]); the specific cause (a rival holder, a
//! non-owner release, or a store failure) travels in the error chain and is
//! reachable through [`std::error::Error::source`].

/// Acquisition was refused because another owner holds the lock.
#[ohno::error]
#[display("lock {key} is already acquired by a rival owner")]
pub struct KeyAlreadyAcquiredError {
    /// The decorated key of the contested lock.
    pub key: String,
}

/// Release was refused because the caller is not the recorded owner.
#[ohno::error]
#[display("release of lock {key} was refused: caller is not the recorded owner")]
pub struct UnownedReleaseError {
    /// The decorated key of the lock.
    pub key: String,
}

/// Refresh was refused: the caller is not the recorded owner, the record is
/// gone, or the lease is unexpireable.
#[ohno::error]
#[display("refresh of lock {key} was refused: caller does not own a refreshable lease")]
pub struct UnownedRefreshError {
    /// The decorated key of the lock.
    pub key: String,
}

/// Raised by [`Lock::acquire_or_fail`][crate::Lock::acquire_or_fail] and the
/// `run` family when acquisition does not succeed.
#[ohno::error]
#[display("failed to acquire lock {key}")]
pub struct AcquireError {
    /// The decorated key of the lock.
    pub key: String,
}

/// Raised by [`Lock::release_or_fail`][crate::Lock::release_or_fail] when the
/// release does not succeed.
#[ohno::error]
#[display("failed to release lock {key}")]
pub struct ReleaseError {
    /// The decorated key of the lock.
    pub key: String,
}

/// Raised by [`Lock::refresh_or_fail`][crate::Lock::refresh_or_fail] when the
/// refresh does not succeed.
#[ohno::error]
#[display("failed to refresh lock {key}")]
pub struct RefreshError {
    /// The decorated key of the lock.
    pub key: String,
}
