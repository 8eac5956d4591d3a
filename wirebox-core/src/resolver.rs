//! The `Resolver` trait, `FactoryBuilder`, and the generic resolve helpers
//! built on top of them.
//!
//! `Resolver` is the object-safe, type-erased core every factory closure is
//! handed: it is implemented by both [`Provider`](crate::provider::Provider)
//! (no active scope) and [`Scope`](crate::scope::Scope) (an active scope),
//! so a constructor written against `&dyn Resolver` works identically
//! whether it runs at the root or inside a scope. The generic, ergonomic
//! `resolve::<T>()` surface lives as free functions here — exactly the shape
//! the teacher this crate is grounded on uses for the same object-safety
//! reason (a trait method cannot itself be generic and still support `dyn`).

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use tracing::{instrument, trace, warn};

use crate::context::ResolutionContext;
use crate::descriptor::Descriptor;
use crate::dispose::{AsyncDispose, Dispose, Disposer};
use crate::error::{CircularDependencyError, NotRegisteredError, Result, WireError};
use crate::graph::DependencyGraph;
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// A compiled, type-erased constructor. Always produces a *fresh* instance;
/// lifetime caching is applied around it by [`dispatch`], never baked into
/// the closure itself — [`Lifetime::Scoped`] in particular needs a cache
/// that does not exist until a [`Scope`](crate::scope::Scope) is created, so
/// the closure cannot capture it at registration time.
pub type FactoryFn =
    Arc<dyn Fn(&dyn Resolver) -> Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// The object-safe resolution surface every factory closure receives.
///
/// Implemented by [`Provider`](crate::provider::Provider) and
/// [`Scope`](crate::scope::Scope). Callers almost never call these methods
/// directly — use the generic [`resolve`], [`resolve_all`] and
/// `register_disposable*` free functions instead, which wrap this trait with
/// a typed, ergonomic API.
pub trait Resolver {
    /// Resolves the last-registered descriptor for `key`.
    fn resolve_key(&self, key: &DependencyKey) -> Result<Arc<dyn Any + Send + Sync>>;

    /// Resolves every descriptor registered for `key`, in registration order.
    fn resolve_all_key(&self, key: &DependencyKey) -> Result<Vec<Arc<dyn Any + Send + Sync>>>;

    /// Registers a disposal hook for an instance a factory just built. The
    /// hook runs when the enclosing scope or the owning provider is
    /// disposed, in LIFO order relative to other disposables registered on
    /// the same resolution target.
    fn register_disposer(&self, disposer: Disposer);
}

/// Resolves `T` through `resolver`, downcasting the result.
///
/// # Examples
/// ```
/// use wirebox_core::container::Container;
///
/// let provider = Container::builder()
///     .register_instance(7i32)
///     .build()
///     .unwrap();
/// let value: i32 = wirebox_core::resolver::resolve(&provider).unwrap();
/// assert_eq!(value, 7);
/// ```
pub fn resolve<T: Send + Sync + 'static>(resolver: &dyn Resolver) -> Result<T>
where
    T: Clone,
{
    let erased = resolver.resolve_key(&DependencyKey::of::<T>())?;
    downcast(erased)
}

/// Resolves every registration for `T`, in registration order — the
/// collection-request form (`IEnumerable<T>` in the source this design is
/// distilled from).
pub fn resolve_all<T: Send + Sync + 'static>(resolver: &dyn Resolver) -> Result<Vec<T>>
where
    T: Clone,
{
    let erased = resolver.resolve_all_key(&DependencyKey::of::<T>())?;
    erased.into_iter().map(downcast).collect()
}

fn downcast<T: Send + Sync + Clone + 'static>(erased: Arc<dyn Any + Send + Sync>) -> Result<T> {
    erased
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| WireError::NoConstructor(DependencyKey::of::<T>()))
}

/// Registers `instance` for synchronous disposal only.
pub fn register_disposable<T: Dispose>(resolver: &dyn Resolver, instance: Arc<T>) {
    resolver.register_disposer(Disposer::Sync(instance));
}

/// Registers `instance` for asynchronous disposal only.
pub fn register_async_disposable<T: AsyncDispose>(resolver: &dyn Resolver, instance: Arc<T>) {
    resolver.register_disposer(Disposer::Async(instance));
}

/// Registers `instance` for both synchronous and asynchronous disposal. Use
/// this (rather than calling both `register_disposable` and
/// `register_async_disposable` with two separately-cloned `Arc`s) so the
/// instance receives exactly one disposal call regardless of which teardown
/// path the owner takes.
pub fn register_disposable_both<T: Dispose + AsyncDispose>(resolver: &dyn Resolver, instance: Arc<T>) {
    resolver.register_disposer(Disposer::Both(instance.clone(), instance));
}

/// Method-call sugar for the free functions above, so a factory can write
/// `resolver.resolve()?` instead of `resolve(resolver)?` — the same
/// ergonomics the free functions exist to provide, just spelled as a method.
impl dyn Resolver + '_ {
    /// See [`resolve`].
    pub fn resolve<T: Send + Sync + Clone + 'static>(&self) -> Result<T> {
        resolve(self)
    }

    /// See [`resolve_all`].
    pub fn resolve_all<T: Send + Sync + Clone + 'static>(&self) -> Result<Vec<T>> {
        resolve_all(self)
    }

    /// See [`register_disposable`].
    pub fn register_disposable<T: Dispose>(&self, instance: Arc<T>) {
        register_disposable(self, instance)
    }

    /// See [`register_async_disposable`].
    pub fn register_async_disposable<T: AsyncDispose>(&self, instance: Arc<T>) {
        register_async_disposable(self, instance)
    }

    /// See [`register_disposable_both`].
    pub fn register_disposable_both<T: Dispose + AsyncDispose>(&self, instance: Arc<T>) {
        register_disposable_both(self, instance)
    }
}

/// Drives registration-time dependency recording, the cycle check, and
/// resolve-time dispatch for one descriptor.
///
/// Construction-time responsibilities (see
/// [`Container::register_type`](crate::container::Container::register_type)):
/// record `I::dependencies()` into the container's [`DependencyGraph`], then
/// immediately check whether the service type can now reach itself. A cycle
/// found here fails the registration call — the registration that completes
/// the cycle is the failure site, not the eventual resolve.
pub(crate) fn check_for_cycle(graph: &DependencyGraph, service_type: &DependencyKey, deps: Vec<DependencyKey>) -> Result<()> {
    graph.add_dependency(service_type.clone(), deps);
    let (cyclic, chain) = graph.has_cycle(service_type);
    if cyclic {
        warn!(service = %service_type, "registration would introduce a dependency cycle");
        return Err(WireError::CircularDependency(CircularDependencyError { chain }));
    }
    Ok(())
}

/// Invokes one descriptor's raw factory (or returns its pre-built instance),
/// guarding re-entrancy via `ctx` and wrapping constructor errors into
/// [`WireError::FactoryFailure`].
///
/// `ctx` is a `RefCell`, not a bare `&mut`, deliberately: a nested
/// `resolver.resolve(Param)` call inside the factory re-enters this function
/// on the very same `ctx` before this call returns. Each enter/exit is a
/// short, separately-scoped borrow rather than one held for the factory's
/// whole execution, so the recursive call never finds the `RefCell` already
/// borrowed.
///
/// This is the one piece every lifetime's caching policy wraps around — see
/// `ActiveResolve::resolve_descriptor` in [`provider`](crate::provider),
/// which applies [`Lifetime::Singleton`]'s, [`Lifetime::PerThread`]'s and
/// [`Lifetime::Scoped`]'s respective caches around calls to this function;
/// [`Lifetime::Transient`] calls it directly, uncached.
#[instrument(level = "trace", skip(descriptor, resolver, ctx), fields(service = %descriptor.service_type()))]
pub(crate) fn guarded_build(
    descriptor: &Descriptor,
    resolver: &dyn Resolver,
    ctx: &RefCell<ResolutionContext>,
) -> Result<Arc<dyn Any + Send + Sync>> {
    if let Some(instance) = descriptor.pre_built_instance() {
        return Ok(instance.clone());
    }

    let key = descriptor.service_type().clone();
    trace!(lifetime = %descriptor.lifetime(), "invoking factory");

    ctx.borrow_mut()
        .try_enter(key.clone())
        .map_err(|chain| WireError::CircularDependency(CircularDependencyError { chain }))?;

    let result = if let Some(factory) = descriptor.user_factory_fn() {
        factory(resolver)
    } else {
        descriptor
            .compiled_factory()
            .ok_or_else(|| WireError::MissingImplementation(key.clone()))
            .and_then(|factory| factory(resolver))
    };

    ctx.borrow_mut().exit();
    result.map_err(|err| wrap_factory_failure(&key, err))
}

fn wrap_factory_failure(key: &DependencyKey, err: WireError) -> WireError {
    match err {
        WireError::CircularDependency(_) => err,
        other => WireError::FactoryFailure {
            key: key.clone(),
            source: Box::new(FactoryFailureInner(other)),
        },
    }
}

#[derive(Debug)]
struct FactoryFailureInner(WireError);

impl std::fmt::Display for FactoryFailureInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FactoryFailureInner {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Builds a [`NotRegisteredError`] with "did you mean?" suggestions, using
/// [`wirebox_support::rendering::suggest_similar`].
pub(crate) fn not_registered(requested: &DependencyKey, known: &[DependencyKey]) -> WireError {
    let names: Vec<&str> = known.iter().map(|k| k.type_name()).collect();
    let suggested_names = wirebox_support::rendering::suggest_similar(requested.type_name(), &names, 3);
    let suggestions = known
        .iter()
        .filter(|k| suggested_names.iter().any(|n| n == k.type_name()))
        .cloned()
        .collect();
    WireError::NotRegistered(NotRegisteredError {
        requested: requested.clone(),
        required_by: None,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NullResolver;
    impl Resolver for NullResolver {
        fn resolve_key(&self, _key: &DependencyKey) -> Result<Arc<dyn Any + Send + Sync>> {
            unreachable!("not exercised in these tests")
        }
        fn resolve_all_key(&self, _key: &DependencyKey) -> Result<Vec<Arc<dyn Any + Send + Sync>>> {
            unreachable!("not exercised in these tests")
        }
        fn register_disposer(&self, _disposer: Disposer) {}
    }

    fn counting_descriptor(calls: Arc<AtomicU32>, lifetime: Lifetime) -> Descriptor {
        Descriptor::implementation(
            DependencyKey::of::<i32>(),
            lifetime,
            vec![],
            Box::new(move || {
                let calls = calls.clone();
                Arc::new(move |_resolver: &dyn Resolver| -> Result<Arc<dyn Any + Send + Sync>> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(1i32) as Arc<dyn Any + Send + Sync>)
                })
            }),
        )
    }

    #[test]
    fn guarded_build_invokes_factory_each_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let descriptor = counting_descriptor(calls.clone(), Lifetime::Transient);
        let resolver = NullResolver;
        let ctx = RefCell::new(ResolutionContext::new());
        guarded_build(&descriptor, &resolver, &ctx).unwrap();
        guarded_build(&descriptor, &resolver, &ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn singleton_cache_wraps_guarded_build() {
        let calls = Arc::new(AtomicU32::new(0));
        let descriptor = counting_descriptor(calls.clone(), Lifetime::Singleton);
        let resolver = NullResolver;
        let ctx = RefCell::new(ResolutionContext::new());
        descriptor
            .cache_singleton(|| guarded_build(&descriptor, &resolver, &ctx))
            .unwrap();
        descriptor
            .cache_singleton(|| guarded_build(&descriptor, &resolver, &ctx))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
