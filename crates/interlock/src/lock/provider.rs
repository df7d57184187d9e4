// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;

use interlock_store::{DynamicLockStore, LockStore, Ttl};
use tick::Clock;

#[cfg(feature = "memory")]
use interlock_memory::MemoryLockStore;

use crate::constants::{DEFAULT_LOCK_NAMESPACE, DEFAULT_LOCK_TRANSPORT_TAG};
use crate::events::{EventBus, ListenerId, LocalBus, Subscription};
use crate::keyspace::Keyspace;
use crate::lock::handle::{LockRuntime, LockTransport};
use crate::lock::{Lock, LockEvent, LockEventKind};
use crate::transport::{TransportError, TransportRegistry};

/// Factory for [`Lock`] handles.
///
/// A provider holds the shared collaborators (store, event bus, clock,
/// keyspace) and the default lease configuration. Handles created by one
/// provider family observe the same shared records and publish on the same
/// bus.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock::LockProvider;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let provider = LockProvider::builder(clock)
///     .memory()
///     .default_ttl(Duration::from_secs(30))
///     .build();
///
/// let lock = provider.lock("reindex").build();
/// ```
#[derive(Debug, Clone)]
pub struct LockProvider {
    runtime: Arc<LockRuntime>,
    keyspace: Keyspace,
    default_ttl: Ttl,
}

impl LockProvider {
    /// Creates a provider builder.
    ///
    /// The clock drives lease expiry math and retry pacing; in production it
    /// comes from your runtime, in tests from `ClockControl`.
    #[must_use]
    pub fn builder(clock: Clock) -> LockProviderBuilder<()> {
        LockProviderBuilder {
            storage: (),
            clock,
            bus: None,
            keyspace: Keyspace::new(DEFAULT_LOCK_NAMESPACE),
            default_ttl: Ttl::Unexpireable,
            transport_tag: DEFAULT_LOCK_TRANSPORT_TAG.to_string(),
        }
    }

    /// Returns a builder for a handle on `key`.
    ///
    /// The key is decorated with the provider's keyspace; the handle's owner
    /// id is generated unless overridden.
    #[must_use]
    pub fn lock(&self, key: &str) -> LockBuilder<'_> {
        LockBuilder {
            provider: self,
            key: key.to_string(),
            ttl: None,
            owner: None,
        }
    }

    /// Returns a sibling provider with an additional keyspace segment.
    ///
    /// Handles from different groups share the store and bus but can never
    /// collide on a key.
    #[must_use]
    pub fn with_group(&self, segment: &str) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            keyspace: self.keyspace.group(segment),
            default_ttl: self.default_ttl,
        }
    }

    /// The provider's keyspace.
    #[must_use]
    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Registers a listener for every lock event on this provider family.
    pub fn add_listener(&self, listener: impl Fn(&LockEvent) + Send + Sync + 'static) -> ListenerId {
        self.runtime.bus.add_listener(Arc::new(listener))
    }

    /// Removes a previously registered listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.runtime.bus.remove_listener(id)
    }

    /// Registers a listener that is removed when the returned
    /// [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(&self, listener: impl Fn(&LockEvent) + Send + Sync + 'static) -> Subscription<LockEvent> {
        let id = self.add_listener(listener);
        Subscription::new(Arc::clone(&self.runtime.bus), id)
    }

    /// Like [`subscribe`][Self::subscribe], filtered to one event kind.
    #[must_use]
    pub fn subscribe_kind(
        &self,
        kind: LockEventKind,
        listener: impl Fn(&LockEvent) + Send + Sync + 'static,
    ) -> Subscription<LockEvent> {
        self.subscribe(move |event| {
            if event.kind() == kind {
                listener(event);
            }
        })
    }

    /// Registers this provider family's rehydrator in a transport registry.
    ///
    /// Handles produced by this family can then round-trip through
    /// [`TransportRegistry::serialize`] /
    /// [`TransportRegistry::deserialize`], rebinding to this provider's
    /// store. Bind once per family and registry; the `transport_tag` builder
    /// override disambiguates multiple families sharing a registry.
    ///
    /// # Errors
    ///
    /// Fails when the provider's transport tag is already registered.
    pub fn bind_transport(&self, registry: &TransportRegistry) -> Result<(), TransportError> {
        let runtime = Arc::clone(&self.runtime);
        registry.register(&self.runtime.transport_tag, move |body| {
            let data: LockTransport = serde_json::from_value(body.clone()).map_err(TransportError::from_message)?;
            Ok(Box::new(Lock::rehydrate(&runtime, data)))
        })
    }
}

/// Builder for [`LockProvider`].
///
/// Created by [`LockProvider::builder`]. The storage backend is chosen with
/// [`storage`][Self::storage] or the `memory` shortcut before `build`.
pub struct LockProviderBuilder<S> {
    storage: S,
    clock: Clock,
    bus: Option<Arc<dyn EventBus<LockEvent>>>,
    keyspace: Keyspace,
    default_ttl: Ttl,
    transport_tag: String,
}

impl<S> std::fmt::Debug for LockProviderBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockProviderBuilder")
            .field("keyspace", &self.keyspace)
            .field("default_ttl", &self.default_ttl)
            .field("transport_tag", &self.transport_tag)
            .finish_non_exhaustive()
    }
}

impl LockProviderBuilder<()> {
    /// Sets a custom storage backend.
    #[must_use]
    pub fn storage<S>(self, storage: S) -> LockProviderBuilder<S>
    where
        S: LockStore + 'static,
    {
        LockProviderBuilder {
            storage,
            clock: self.clock,
            bus: self.bus,
            keyspace: self.keyspace,
            default_ttl: self.default_ttl,
            transport_tag: self.transport_tag,
        }
    }

    /// Uses the in-memory store, sharing the provider's clock.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self) -> LockProviderBuilder<MemoryLockStore> {
        let store = MemoryLockStore::new(&self.clock);
        self.storage(store)
    }
}

impl<S> LockProviderBuilder<S> {
    /// Replaces the in-process event bus with a custom one.
    #[must_use]
    pub fn bus(mut self, bus: Arc<dyn EventBus<LockEvent>>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Sets the keyspace that decorates every key of this provider.
    #[must_use]
    pub fn keyspace(mut self, keyspace: Keyspace) -> Self {
        self.keyspace = keyspace;
        self
    }

    /// Sets the default lease used by handles without an explicit ttl.
    #[must_use]
    pub fn default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.default_ttl = ttl.into();
        self
    }

    /// Overrides the transport tag this family registers under.
    #[must_use]
    pub fn transport_tag(mut self, tag: impl Into<String>) -> Self {
        self.transport_tag = tag.into();
        self
    }
}

impl<S> LockProviderBuilder<S>
where
    S: LockStore + 'static,
{
    /// Builds the provider.
    #[must_use]
    pub fn build(self) -> LockProvider {
        LockProvider {
            runtime: Arc::new(LockRuntime {
                store: DynamicLockStore::new(self.storage),
                bus: self.bus.unwrap_or_else(|| Arc::new(LocalBus::new())),
                clock: self.clock,
                transport_tag: self.transport_tag.into(),
            }),
            keyspace: self.keyspace,
            default_ttl: self.default_ttl,
        }
    }
}

/// Builder for a single [`Lock`] handle.
///
/// Created by [`LockProvider::lock`]; overrides win over the provider's
/// defaults.
#[derive(Debug)]
pub struct LockBuilder<'a> {
    provider: &'a LockProvider,
    key: String,
    ttl: Option<Ttl>,
    owner: Option<String>,
}

impl LockBuilder<'_> {
    /// Overrides the lease for this handle.
    #[must_use]
    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Supplies the owner id instead of generating one.
    ///
    /// Two handles with the same key and owner are interchangeable proofs of
    /// the same ownership.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Builds the handle.
    #[must_use]
    pub fn build(self) -> Lock {
        let provider = self.provider;
        Lock::new(
            Arc::clone(&provider.runtime),
            provider.keyspace.decorate(&self.key),
            self.owner.unwrap_or_else(generate_owner),
            self.ttl.unwrap_or(provider.default_ttl),
        )
    }
}

/// Random 128-bit hex owner id.
fn generate_owner() -> String {
    format!("{:032x}", fastrand::u128(..))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_owners_are_unique_and_hex() {
        let a = generate_owner();
        let b = generate_owner();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
