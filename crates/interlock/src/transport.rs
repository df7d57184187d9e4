// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Handle transport: serializing handles so they can be rebuilt in another
//! process against the same shared state.
//!
//! A handle is a value type: it captures *which* key, owner, and policy it
//! controls, never the live remote state. Serialization therefore records a
//! compact identity payload inside a tagged envelope; deserialization is
//! contextual, rebuilding the handle against the collaborators (store, bus,
//! clock) of a provider in the *deserializing* process.
//!
//! Providers register their rehydrator in a [`TransportRegistry`] under a
//! string tag (see `bind_transport` on the providers). Registering two
//! rehydrators under one tag in a shared registry is a configuration error;
//! use the providers' `transport_tag` override to disambiguate.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// An error raised by handle transport.
///
/// Covers tag collisions at registration time, unknown tags, payload codec
/// failures, and type mismatches at [`TransportRegistry::deserialize`] time.
/// The cause chain carries the details.
#[ohno::error]
pub struct TransportError {}

impl TransportError {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating transport errors from custom
    /// rehydrators registered through [`TransportRegistry::register`].
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// The wire form: a tag naming the registered rehydrator plus the handle's
/// identity payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    tag: String,
    body: serde_json::Value,
}

type Rehydrator = Arc<dyn Fn(&serde_json::Value) -> Result<Box<dyn Any + Send>, TransportError> + Send + Sync>;

/// A value that can round-trip through bytes via a [`TransportRegistry`].
pub trait Transportable {
    /// The tag naming the rehydrator responsible for this value.
    fn transport_tag(&self) -> &str;

    /// The identity payload recorded on the wire.
    fn transport_body(&self) -> Result<serde_json::Value, TransportError>;
}

/// Associates transport tags with rehydrator closures.
///
/// A registry belongs to one process; the rehydrators registered in it close
/// over that process's providers. See the module docs for the transport
/// model.
///
/// # Examples
///
/// ```
/// use interlock::{LockProvider, TransportRegistry};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let registry = TransportRegistry::new();
/// let provider = LockProvider::builder(clock).memory().build();
/// provider.bind_transport(&registry)?;
///
/// let lock = provider.lock("jobs").build();
/// let bytes = registry.serialize(&lock)?;
/// let restored: interlock::Lock = registry.deserialize(&bytes)?;
/// assert_eq!(restored.key(), lock.key());
/// # Ok::<(), interlock::TransportError>(())
/// # });
/// ```
#[derive(Default)]
pub struct TransportRegistry {
    rehydrators: Mutex<HashMap<String, Rehydrator>>,
}

impl std::fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tags: Vec<String> = self.rehydrators.lock().keys().cloned().collect();
        f.debug_struct("TransportRegistry").field("tags", &tags).finish()
    }
}

impl TransportRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rehydrator under a tag.
    ///
    /// # Errors
    ///
    /// Fails when the tag is already taken; a collision means two providers
    /// sharing this registry were configured with the same `transport_tag`.
    pub fn register<F>(&self, tag: &str, rehydrate: F) -> Result<(), TransportError>
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Any + Send>, TransportError> + Send + Sync + 'static,
    {
        let mut rehydrators = self.rehydrators.lock();
        if rehydrators.contains_key(tag) {
            return Err(TransportError::from_message(format!(
                "transport tag {tag:?} is already registered"
            )));
        }
        rehydrators.insert(tag.to_string(), Arc::new(rehydrate));
        Ok(())
    }

    /// Returns `true` when a rehydrator is registered under the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.rehydrators.lock().contains_key(tag)
    }

    /// Serializes a handle into its tagged wire form.
    ///
    /// # Errors
    ///
    /// Fails when the identity payload cannot be encoded.
    pub fn serialize<T: Transportable>(&self, value: &T) -> Result<Vec<u8>, TransportError> {
        let envelope = Envelope {
            tag: value.transport_tag().to_string(),
            body: value.transport_body()?,
        };
        serde_json::to_vec(&envelope).map_err(TransportError::from_message)
    }

    /// Rebuilds a handle from its wire form.
    ///
    /// # Errors
    ///
    /// Fails when the envelope cannot be decoded, the tag is unknown to this
    /// registry, or the rehydrated value is not a `T`.
    pub fn deserialize<T: Any>(&self, bytes: &[u8]) -> Result<T, TransportError> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(TransportError::from_message)?;

        let rehydrate = self
            .rehydrators
            .lock()
            .get(&envelope.tag)
            .map(Arc::clone)
            .ok_or_else(|| TransportError::from_message(format!("unknown transport tag {:?}", envelope.tag)))?;

        let value = rehydrate(&envelope.body)?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_value| TransportError::from_message(format!("transport tag {:?} rehydrated a different type", envelope.tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_u32(registry: &TransportRegistry, tag: &str) -> Result<(), TransportError> {
        registry.register(tag, |body| {
            let value: u32 = serde_json::from_value(body.clone()).map_err(TransportError::from_message)?;
            Ok(Box::new(value))
        })
    }

    struct Datum(u32);

    impl Transportable for Datum {
        fn transport_tag(&self) -> &str {
            "test/datum"
        }

        fn transport_body(&self) -> Result<serde_json::Value, TransportError> {
            serde_json::to_value(self.0).map_err(TransportError::from_message)
        }
    }

    #[test]
    fn round_trip() {
        let registry = TransportRegistry::new();
        register_u32(&registry, "test/datum").unwrap();

        let bytes = registry.serialize(&Datum(17)).unwrap();
        let restored: u32 = registry.deserialize(&bytes).unwrap();
        assert_eq!(restored, 17);
    }

    #[test]
    fn tag_collision_is_an_error() {
        let registry = TransportRegistry::new();
        register_u32(&registry, "test/datum").unwrap();

        let collision = register_u32(&registry, "test/datum");
        assert!(collision.is_err());
        assert!(registry.contains("test/datum"));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let registry = TransportRegistry::new();
        let bytes = registry.serialize(&Datum(17)).unwrap();

        let result: Result<u32, _> = registry.deserialize(&bytes);
        let error = result.unwrap_err();
        assert!(format!("{error}").contains("unknown transport tag"));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let registry = TransportRegistry::new();
        register_u32(&registry, "test/datum").unwrap();

        let bytes = registry.serialize(&Datum(17)).unwrap();
        let result: Result<String, _> = registry.deserialize(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_envelope_is_an_error() {
        let registry = TransportRegistry::new();
        let result: Result<u32, _> = registry.deserialize(b"not json");
        assert!(result.is_err());
    }
}
