//! Registration records.
//!
//! A [`Descriptor`] is the immutable-after-registration record of one
//! service binding: what key it answers to, how to build it (or the
//! pre-built value/user factory it already holds), its [`Lifetime`], and the
//! once-initialised cache slots the [`Resolver`](crate::resolver) dispatch
//! table populates the first time each lifetime's cache applies.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::resolver::{FactoryFn, Resolver};

/// What a [`Descriptor`] produces, and how.
pub(crate) enum DescriptorKind {
    /// Built from an [`Injectable`](crate::introspect::Injectable) type via
    /// [`FactoryBuilder`](crate::resolver). The constructor closure is
    /// compiled lazily, on first resolve, and cached — never invoked at
    /// registration time.
    ImplementationType(ImplementationEntry),
    /// A user-supplied closure. Never walks [`Injectable`]; the caller is
    /// responsible for resolving its own dependencies through the
    /// [`Resolver`] it receives.
    UserFactory(FactoryFn),
    /// An already-constructed value, wrapped at registration time. Always
    /// paired with [`Lifetime::Singleton`].
    PreBuiltInstance(Arc<dyn Any + Send + Sync>),
}

/// The compiled-lazily half of an `ImplementationType` descriptor.
pub(crate) struct ImplementationEntry {
    /// Parameter types recorded into the [`DependencyGraph`](crate::graph::DependencyGraph)
    /// at registration time.
    pub dependencies: Vec<DependencyKey>,
    /// Published at most once; readers after that are lock-free.
    pub cached_factory: OnceCell<FactoryFn>,
    /// Builds the actual factory closure. Cheap to call in this
    /// implementation (there is no expression-tree compilation to defer),
    /// but kept behind `cached_factory`'s once-cell so the dispatch contract
    /// — "only one thread compiles; others wait, then read the published
    /// factory" — holds regardless.
    pub compile: Box<dyn Fn() -> FactoryFn + Send + Sync>,
}

/// One service registration.
///
/// Equality is by identity: two `Arc<Descriptor>` handles are "the same
/// descriptor" iff [`Arc::ptr_eq`] holds, never by comparing contents.
pub struct Descriptor {
    pub(crate) service_type: DependencyKey,
    pub(crate) lifetime: Lifetime,
    pub(crate) kind: DescriptorKind,
    singleton_slot: OnceCell<Arc<dyn Any + Send + Sync>>,
    thread_slots: DashMap<ThreadId, Arc<dyn Any + Send + Sync>>,
}

impl Descriptor {
    pub(crate) fn implementation(
        service_type: DependencyKey,
        lifetime: Lifetime,
        dependencies: Vec<DependencyKey>,
        compile: Box<dyn Fn() -> FactoryFn + Send + Sync>,
    ) -> Self {
        Self {
            service_type,
            lifetime,
            kind: DescriptorKind::ImplementationType(ImplementationEntry {
                dependencies,
                cached_factory: OnceCell::new(),
                compile,
            }),
            singleton_slot: OnceCell::new(),
            thread_slots: DashMap::new(),
        }
    }

    pub(crate) fn user_factory(
        service_type: DependencyKey,
        lifetime: Lifetime,
        factory: FactoryFn,
    ) -> Self {
        Self {
            service_type,
            lifetime,
            kind: DescriptorKind::UserFactory(factory),
            singleton_slot: OnceCell::new(),
            thread_slots: DashMap::new(),
        }
    }

    pub(crate) fn pre_built(service_type: DependencyKey, instance: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            service_type,
            lifetime: Lifetime::Singleton,
            kind: DescriptorKind::PreBuiltInstance(instance),
            singleton_slot: OnceCell::new(),
            thread_slots: DashMap::new(),
        }
    }

    pub fn service_type(&self) -> &DependencyKey {
        &self.service_type
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Parameter types this descriptor's constructor declared, if it is an
    /// `ImplementationType` descriptor (empty for `UserFactory` /
    /// `PreBuiltInstance`, which never walk [`Injectable`]).
    pub fn dependencies(&self) -> &[DependencyKey] {
        match &self.kind {
            DescriptorKind::ImplementationType(entry) => &entry.dependencies,
            _ => &[],
        }
    }

    /// Returns the compiled factory, building and publishing it on first
    /// use if this is an `ImplementationType` descriptor. `None` for the
    /// other two kinds, which the caller handles directly.
    pub(crate) fn compiled_factory(&self) -> Option<&FactoryFn> {
        match &self.kind {
            DescriptorKind::ImplementationType(entry) => {
                Some(entry.cached_factory.get_or_init(|| (entry.compile)()))
            }
            _ => None,
        }
    }

    /// Runs this descriptor's lifetime caching policy around its raw
    /// factory invocation. `raw` produces a fresh instance each call.
    pub(crate) fn cache_for_thread(
        &self,
        build: impl FnOnce() -> crate::error::Result<Arc<dyn Any + Send + Sync>>,
    ) -> crate::error::Result<Arc<dyn Any + Send + Sync>> {
        let tid = std::thread::current().id();
        if let Some(existing) = self.thread_slots.get(&tid) {
            return Ok(existing.clone());
        }
        let value = build()?;
        self.thread_slots.insert(tid, value.clone());
        Ok(value)
    }

    pub(crate) fn cache_singleton(
        &self,
        build: impl FnOnce() -> crate::error::Result<Arc<dyn Any + Send + Sync>>,
    ) -> crate::error::Result<Arc<dyn Any + Send + Sync>> {
        self.singleton_slot.get_or_try_init(build).cloned()
    }

    pub(crate) fn pre_built_instance(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        match &self.kind {
            DescriptorKind::PreBuiltInstance(instance) => Some(instance),
            _ => None,
        }
    }

    pub(crate) fn user_factory_fn(&self) -> Option<&FactoryFn> {
        match &self.kind {
            DescriptorKind::UserFactory(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            DescriptorKind::ImplementationType(_) => "ImplementationType",
            DescriptorKind::UserFactory(_) => "UserFactory",
            DescriptorKind::PreBuiltInstance(_) => "PreBuiltInstance",
        };
        f.debug_struct("Descriptor")
            .field("service_type", &self.service_type)
            .field("lifetime", &self.lifetime)
            .field("kind", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_built_has_singleton_lifetime() {
        let descriptor = Descriptor::pre_built(
            DependencyKey::of::<i32>(),
            Arc::new(42i32) as Arc<dyn Any + Send + Sync>,
        );
        assert_eq!(descriptor.lifetime(), Lifetime::Singleton);
        assert!(descriptor.pre_built_instance().is_some());
    }

    #[test]
    fn implementation_dependencies_visible() {
        let descriptor = Descriptor::implementation(
            DependencyKey::of::<i32>(),
            Lifetime::Transient,
            vec![DependencyKey::of::<String>()],
            Box::new(|| unreachable!()),
        );
        assert_eq!(descriptor.dependencies(), &[DependencyKey::of::<String>()]);
    }

    #[test]
    fn thread_cache_reuses_same_thread() {
        let descriptor = Descriptor::implementation(
            DependencyKey::of::<i32>(),
            Lifetime::PerThread,
            vec![],
            Box::new(|| unreachable!()),
        );
        let a = descriptor
            .cache_for_thread(|| Ok(Arc::new(1i32) as Arc<dyn Any + Send + Sync>))
            .unwrap();
        let b = descriptor
            .cache_for_thread(|| Ok(Arc::new(2i32) as Arc<dyn Any + Send + Sync>))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn singleton_cache_initialises_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let descriptor = Descriptor::implementation(
            DependencyKey::of::<i32>(),
            Lifetime::Singleton,
            vec![],
            Box::new(|| unreachable!()),
        );
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            descriptor
                .cache_singleton(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(7i32) as Arc<dyn Any + Send + Sync>)
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
