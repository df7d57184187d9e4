// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Named, owner-scoped, leased mutual exclusion over a pluggable store.
//!
//! The primary types are:
//!
//! - [`LockProvider`]: a factory holding the shared collaborators (store,
//!   event bus, clock, keyspace) and the default configuration.
//! - [`Lock`]: a per-key handle exposing try/blocking/scoped acquisition,
//!   owner-gated release and refresh, force-release, and introspection.
//!
//! A `Lock` is a value, not a resource: it captures a key, an owner id, and a
//! lease configuration, while all mutable state lives behind the
//! [`LockStore`][interlock_store::LockStore] port. Handles with equal
//! decorated keys refer to the same shared lock; handles with the same key
//! but different owners are rivals.
//!
//! # Quick start
//!
//! ```
//! use interlock::LockProvider;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let provider = LockProvider::builder(clock).memory().build();
//!
//! let lock = provider.lock("reindex").build();
//! if lock.acquire().await? {
//!     // ... the critical section ...
//!     lock.release().await?;
//! }
//! # Ok::<(), interlock::StoreError>(())
//! # });
//! ```
//!
//! For scoped execution that guarantees release on every exit path, use
//! [`Lock::run`]:
//!
//! ```
//! use interlock::LockProvider;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let provider = LockProvider::builder(clock).memory().build();
//!
//! let lock = provider.lock("reindex").build();
//! let outcome = lock.run(|| async { 2 + 2 }).await?;
//! assert_eq!(outcome, 4);
//! # Ok::<(), interlock::lock::AcquireError>(())
//! # });
//! ```

mod errors;
pub use errors::{AcquireError, KeyAlreadyAcquiredError, ReleaseError, RefreshError, UnownedReleaseError, UnownedRefreshError};

mod events;
pub use events::{LockEvent, LockEventKind, LockSnapshot};

mod state;
pub use state::LockState;

mod handle;
pub use handle::Lock;

mod provider;
pub use provider::{LockBuilder, LockProvider, LockProviderBuilder};
