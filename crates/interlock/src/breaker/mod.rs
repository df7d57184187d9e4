// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Named circuit breakers that short-circuit calls to degraded dependencies.
//!
//! The primary types are:
//!
//! - [`BreakerProvider`]: a factory holding the shared collaborators and the
//!   default classification policy.
//! - [`CircuitBreaker`]: a per-key execution wrapper that gates calls on the
//!   circuit state and feeds call outcomes back into the store.
//!
//! A circuit is `Closed` (calls pass, outcomes tracked), `Open` (calls
//! rejected until a cool-down elapses), `HalfOpen` (a limited probe window),
//! or `Isolated` (operator-forced open until reset). The transition rules
//! live behind the [`BreakerStore`][interlock_store::BreakerStore] port; the
//! handle classifies each call's outcome — error-policy match, slow call, or
//! success — according to its [`Trigger`] and reports it.
//!
//! ```text
//! ┌────────┐      failure ratio crossed       ┌──────────┐
//! │ Closed │ ────────────────────────────────▶│   Open   │
//! └────────┘                                  └──────────┘
//!      ▲                                            │
//!      │          ┌────────────────┐                │
//!      └──────────│    HalfOpen    │◀───────────────┘
//!      probing    └────────────────┘    cool-down elapsed
//!      succeeded
//! ```
//!
//! # Quick start
//!
//! ```
//! use interlock::BreakerProvider;
//! use interlock_memory::BreakerPolicy;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let provider = BreakerProvider::builder(clock).memory(BreakerPolicy::new()).build();
//!
//! let breaker = provider.breaker("billing").build();
//! let reply = breaker
//!     .run(|| async { Ok::<_, std::io::Error>("charged") })
//!     .await;
//! assert!(matches!(reply, Ok("charged")));
//! # });
//! ```

mod errors;
pub use errors::{BreakerError, IsolatedCircuitError, OpenCircuitError};

mod events;
pub use events::{BreakerEvent, BreakerEventKind, BreakerSnapshot};

mod policy;
pub use policy::{ErrorPolicy, Trigger};

mod handle;
pub use handle::CircuitBreaker;

mod provider;
pub use provider::{BreakerBuilder, BreakerProvider, BreakerProviderBuilder};
