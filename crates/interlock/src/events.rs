// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Typed event bus port and the in-process implementation.
//!
//! Lock and breaker handles publish their lifecycle as typed events on a bus
//! shared through their provider. The library itself never logs; consumers
//! subscribe for observability. The bus is a port: [`LocalBus`] is the
//! in-process fan-out implementation, and custom buses (e.g. bridging into a
//! process-wide pub/sub system) implement [`EventBus`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A registered event handler.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A typed publish/subscribe channel.
///
/// Implementations must be safe for concurrent publication and subscription.
/// Listeners receive every dispatched event; filtering by event kind is done
/// by the listener (see the `subscribe_kind` helpers on the providers).
pub trait EventBus<E: 'static>: Send + Sync {
    /// Publishes an event to all registered listeners.
    fn dispatch(&self, event: &E);

    /// Registers a listener and returns its id.
    fn add_listener(&self, listener: Listener<E>) -> ListenerId;

    /// Removes a previously registered listener.
    ///
    /// Returns `false` when the id is unknown (e.g. already removed).
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// An in-process [`EventBus`].
///
/// Dispatch snapshots the listener list and invokes handlers outside the
/// internal lock, so listeners may add or remove listeners (including
/// themselves) without deadlocking.
pub struct LocalBus<E: 'static> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener<E>)>>,
}

impl<E: 'static> std::fmt::Debug for LocalBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBus")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl<E: 'static> Default for LocalBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> LocalBus<E> {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<E: 'static> EventBus<E> for LocalBus<E> {
    fn dispatch(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self.listeners.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn add_listener(&self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

/// A registration that removes its listener when dropped.
///
/// Returned by the `subscribe` family of provider methods.
pub struct Subscription<E: 'static> {
    bus: Arc<dyn EventBus<E>>,
    id: ListenerId,
    active: bool,
}

impl<E: 'static> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).field("active", &self.active).finish()
    }
}

impl<E: 'static> Subscription<E> {
    pub(crate) fn new(bus: Arc<dyn EventBus<E>>, id: ListenerId) -> Self {
        Self { bus, id, active: true }
    }

    /// Removes the listener now instead of at drop time.
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.active {
            self.active = false;
            self.bus.remove_listener(self.id);
        }
    }
}

impl<E: 'static> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener<u32> {
        let counter = Arc::clone(counter);
        Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn dispatch_reaches_all_listeners() {
        let bus = LocalBus::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let _a = bus.add_listener(counting_listener(&counter));
        let _b = bus.add_listener(counting_listener(&counter));

        bus.dispatch(&7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn removed_listener_is_not_invoked() {
        let bus = LocalBus::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let id = bus.add_listener(counting_listener(&counter));
        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));

        bus.dispatch(&7);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscription_unsubscribes_on_drop() {
        let bus: Arc<LocalBus<u32>> = Arc::new(LocalBus::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let id = bus.add_listener(counting_listener(&counter));
        let subscription = Subscription::new(Arc::clone(&bus) as Arc<dyn EventBus<u32>>, id);
        assert_eq!(bus.listener_count(), 1);

        drop(subscription);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn listener_may_remove_itself_during_dispatch() {
        let bus: Arc<LocalBus<u32>> = Arc::new(LocalBus::new());
        let bus_clone = Arc::clone(&bus);

        let id_cell = Arc::new(Mutex::new(None::<ListenerId>));
        let id_for_listener = Arc::clone(&id_cell);
        let id = bus.add_listener(Arc::new(move |_event| {
            if let Some(id) = *id_for_listener.lock() {
                bus_clone.remove_listener(id);
            }
        }));
        *id_cell.lock() = Some(id);

        bus.dispatch(&1);
        assert_eq!(bus.listener_count(), 0);
    }
}
