//! Dependency registry — stores every registration for a container.
//!
//! Unlike a single-slot map, [`Registry`] keeps an ordered list per key:
//! registering the same service type twice never fails or overwrites,
//! it appends. The last entry is what a singular `resolve` picks up;
//! the full list is what `resolve_all` walks — see
//! [`Container::register_type`](crate::container::Container::register_type)
//! and [`resolve_all`](crate::resolver::resolve_all).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::Descriptor;
use crate::key::DependencyKey;

/// Ordered, append-only store of [`Descriptor`]s per [`DependencyKey`].
///
/// Populated during the build phase and consulted for the life of the
/// owning [`Container`](crate::container::Container) — once built, entries
/// are never removed or replaced, only appended to by further registration
/// calls on the same builder.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    descriptors: HashMap<DependencyKey, Vec<Arc<Descriptor>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `descriptor` to the list for its service type. Never fails,
    /// never overwrites — multiple registrations for the same key are the
    /// supported way to back a collection-request resolve.
    pub fn register(&mut self, descriptor: Arc<Descriptor>) {
        let key = descriptor.service_type().clone();
        debug!(key = %key, lifetime = %descriptor.lifetime(), "registered dependency");
        self.descriptors.entry(key).or_default().push(descriptor);
    }

    /// Returns the most recently registered descriptor for `key`, the one a
    /// singular `resolve` uses ("last wins").
    pub fn get_descriptor(&self, key: &DependencyKey) -> Option<&Arc<Descriptor>> {
        self.descriptors.get(key).and_then(|list| list.last())
    }

    /// Returns every descriptor registered for `key`, in registration order.
    pub fn get_descriptors(&self, key: &DependencyKey) -> &[Arc<Descriptor>] {
        self.descriptors
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns every distinct registered service type, for "did you mean?"
    /// suggestions on a failed resolve.
    pub fn registered_keys(&self) -> Vec<DependencyKey> {
        self.descriptors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
