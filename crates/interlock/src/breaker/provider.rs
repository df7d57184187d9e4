// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use anyspawn::Spawner;
use interlock_store::{BreakerStore, DynamicBreakerStore};
use tick::Clock;

#[cfg(feature = "memory")]
use interlock_memory::{BreakerPolicy, MemoryBreakerStore};

use crate::breaker::handle::{BreakerRuntime, BreakerTransport};
use crate::breaker::{BreakerEvent, BreakerEventKind, CircuitBreaker, ErrorPolicy, Trigger};
use crate::constants::{DEFAULT_BREAKER_NAMESPACE, DEFAULT_BREAKER_TRANSPORT_TAG};
use crate::events::{EventBus, ListenerId, LocalBus, Subscription};
use crate::keyspace::Keyspace;
use crate::transport::{TransportError, TransportRegistry};

/// Factory for [`CircuitBreaker`] handles.
///
/// A provider holds the shared collaborators (store, event bus, clock,
/// keyspace, optional spawner) and the default classification policy.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock::{BreakerProvider, Trigger};
/// use interlock_memory::BreakerPolicy;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let provider = BreakerProvider::builder(clock)
///     .memory(BreakerPolicy::new())
///     .trigger(Trigger::Both)
///     .slow_call_time(Duration::from_millis(250))
///     .build();
///
/// let breaker = provider.breaker("payments").build();
/// ```
#[derive(Debug, Clone)]
pub struct BreakerProvider {
    runtime: Arc<BreakerRuntime>,
    keyspace: Keyspace,
    defaults: BreakerDefaults,
}

#[derive(Debug, Clone)]
struct BreakerDefaults {
    trigger: Trigger,
    slow_call_time: Option<Duration>,
    error_policy: ErrorPolicy,
    async_tracking: bool,
}

impl BreakerProvider {
    /// Creates a provider builder.
    #[must_use]
    pub fn builder(clock: Clock) -> BreakerProviderBuilder<()> {
        BreakerProviderBuilder {
            storage: (),
            clock,
            bus: None,
            keyspace: Keyspace::new(DEFAULT_BREAKER_NAMESPACE),
            transport_tag: DEFAULT_BREAKER_TRANSPORT_TAG.to_string(),
            spawner: None,
            defaults: BreakerDefaults {
                trigger: Trigger::default(),
                slow_call_time: None,
                error_policy: ErrorPolicy::all(),
                async_tracking: false,
            },
        }
    }

    /// Returns a builder for a handle on `key`.
    #[must_use]
    pub fn breaker(&self, key: &str) -> BreakerBuilder<'_> {
        BreakerBuilder {
            provider: self,
            key: key.to_string(),
            trigger: None,
            slow_call_time: None,
            error_policy: None,
            async_tracking: None,
        }
    }

    /// Returns a sibling provider with an additional keyspace segment.
    #[must_use]
    pub fn with_group(&self, segment: &str) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            keyspace: self.keyspace.group(segment),
            defaults: self.defaults.clone(),
        }
    }

    /// The provider's keyspace.
    #[must_use]
    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Registers a listener for every breaker event on this provider family.
    pub fn add_listener(&self, listener: impl Fn(&BreakerEvent) + Send + Sync + 'static) -> ListenerId {
        self.runtime.bus.add_listener(Arc::new(listener))
    }

    /// Removes a previously registered listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.runtime.bus.remove_listener(id)
    }

    /// Registers a listener that is removed when the returned
    /// [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(&self, listener: impl Fn(&BreakerEvent) + Send + Sync + 'static) -> Subscription<BreakerEvent> {
        let id = self.add_listener(listener);
        Subscription::new(Arc::clone(&self.runtime.bus), id)
    }

    /// Like [`subscribe`][Self::subscribe], filtered to one event kind.
    #[must_use]
    pub fn subscribe_kind(
        &self,
        kind: BreakerEventKind,
        listener: impl Fn(&BreakerEvent) + Send + Sync + 'static,
    ) -> Subscription<BreakerEvent> {
        self.subscribe(move |event| {
            if event.kind() == kind {
                listener(event);
            }
        })
    }

    /// Registers this provider family's rehydrator in a transport registry.
    ///
    /// Rehydrated handles bind to this provider's collaborators; the error
    /// policy does not travel and is taken from this provider's defaults.
    ///
    /// # Errors
    ///
    /// Fails when the provider's transport tag is already registered.
    pub fn bind_transport(&self, registry: &TransportRegistry) -> Result<(), TransportError> {
        let runtime = Arc::clone(&self.runtime);
        let error_policy = self.defaults.error_policy.clone();
        registry.register(&self.runtime.transport_tag, move |body| {
            let data: BreakerTransport = serde_json::from_value(body.clone()).map_err(TransportError::from_message)?;
            Ok(Box::new(CircuitBreaker::rehydrate(&runtime, data, error_policy.clone())))
        })
    }
}

/// Builder for [`BreakerProvider`].
pub struct BreakerProviderBuilder<S> {
    storage: S,
    clock: Clock,
    bus: Option<Arc<dyn EventBus<BreakerEvent>>>,
    keyspace: Keyspace,
    transport_tag: String,
    spawner: Option<Spawner>,
    defaults: BreakerDefaults,
}

impl<S> std::fmt::Debug for BreakerProviderBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerProviderBuilder")
            .field("keyspace", &self.keyspace)
            .field("transport_tag", &self.transport_tag)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl BreakerProviderBuilder<()> {
    /// Sets a custom storage backend.
    #[must_use]
    pub fn storage<S>(self, storage: S) -> BreakerProviderBuilder<S>
    where
        S: BreakerStore + 'static,
    {
        BreakerProviderBuilder {
            storage,
            clock: self.clock,
            bus: self.bus,
            keyspace: self.keyspace,
            transport_tag: self.transport_tag,
            spawner: self.spawner,
            defaults: self.defaults,
        }
    }

    /// Uses the in-memory store with the given transition policy, sharing
    /// the provider's clock.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self, policy: BreakerPolicy) -> BreakerProviderBuilder<MemoryBreakerStore> {
        let store = MemoryBreakerStore::new(&self.clock, policy);
        self.storage(store)
    }
}

impl<S> BreakerProviderBuilder<S> {
    /// Replaces the in-process event bus with a custom one.
    #[must_use]
    pub fn bus(mut self, bus: Arc<dyn EventBus<BreakerEvent>>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Sets the keyspace that decorates every key of this provider.
    #[must_use]
    pub fn keyspace(mut self, keyspace: Keyspace) -> Self {
        self.keyspace = keyspace;
        self
    }

    /// Overrides the transport tag this family registers under.
    #[must_use]
    pub fn transport_tag(mut self, tag: impl Into<String>) -> Self {
        self.transport_tag = tag.into();
        self
    }

    /// Default trigger for handles of this provider.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.defaults.trigger = trigger;
        self
    }

    /// Default slow-call threshold for handles of this provider.
    #[must_use]
    pub fn slow_call_time(mut self, threshold: Duration) -> Self {
        self.defaults.slow_call_time = Some(threshold);
        self
    }

    /// Default error policy for handles of this provider.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.defaults.error_policy = policy;
        self
    }

    /// Runs per-call bookkeeping on the given spawner instead of blocking
    /// the caller.
    ///
    /// Tracking is still issued exactly once per call, but ordering between
    /// a call's outcome and its metric update is no longer guaranteed across
    /// calls, and store failures surface as
    /// [`BreakerEvent::TrackingFailed`] events.
    #[must_use]
    pub fn async_tracking(mut self, spawner: Spawner) -> Self {
        self.spawner = Some(spawner);
        self.defaults.async_tracking = true;
        self
    }
}

impl<S> BreakerProviderBuilder<S>
where
    S: BreakerStore + 'static,
{
    /// Builds the provider.
    #[must_use]
    pub fn build(self) -> BreakerProvider {
        BreakerProvider {
            runtime: Arc::new(BreakerRuntime {
                store: DynamicBreakerStore::new(self.storage),
                bus: self.bus.unwrap_or_else(|| Arc::new(LocalBus::new())),
                clock: self.clock,
                spawner: self.spawner,
                transport_tag: self.transport_tag.into(),
            }),
            keyspace: self.keyspace,
            defaults: self.defaults,
        }
    }
}

/// Builder for a single [`CircuitBreaker`] handle.
///
/// Created by [`BreakerProvider::breaker`]; overrides win over the
/// provider's defaults.
#[derive(Debug)]
pub struct BreakerBuilder<'a> {
    provider: &'a BreakerProvider,
    key: String,
    trigger: Option<Trigger>,
    slow_call_time: Option<Duration>,
    error_policy: Option<ErrorPolicy>,
    async_tracking: Option<bool>,
}

impl BreakerBuilder<'_> {
    /// Overrides the trigger for this handle.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Overrides the slow-call threshold for this handle.
    #[must_use]
    pub fn slow_call_time(mut self, threshold: Duration) -> Self {
        self.slow_call_time = Some(threshold);
        self
    }

    /// Overrides the error policy for this handle.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = Some(policy);
        self
    }

    /// Overrides async tracking for this handle.
    ///
    /// Has no effect unless the provider was built with a spawner.
    #[must_use]
    pub fn async_tracking(mut self, enabled: bool) -> Self {
        self.async_tracking = Some(enabled);
        self
    }

    /// Builds the handle.
    #[must_use]
    pub fn build(self) -> CircuitBreaker {
        let provider = self.provider;
        let defaults = &provider.defaults;
        CircuitBreaker::new(
            Arc::clone(&provider.runtime),
            provider.keyspace.decorate(&self.key),
            self.trigger.unwrap_or(defaults.trigger),
            self.slow_call_time.or(defaults.slow_call_time),
            self.error_policy.unwrap_or_else(|| defaults.error_policy.clone()),
            self.async_tracking.unwrap_or(defaults.async_tracking),
        )
    }
}
