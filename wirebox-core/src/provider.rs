//! The root resolve facade.
//!
//! [`Provider`] is what applications actually hold and resolve through. It
//! owns the built [`Container`] (shared with every [`Scope`] it creates),
//! and its own disposal list for instances built with no active scope.

use std::any::Any;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::container::Container;
use crate::context::ResolutionContext;
use crate::dispose::Disposer;
use crate::error::{DisposedTarget, Result, WireError};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::resolver::{self, guarded_build, not_registered, Resolver};
use crate::scope::Scope;

/// Owns a built container and is the entry point every top-level resolve
/// starts from.
///
/// `Provider` does not itself implement [`Resolver`] — resolving
/// concurrently from many threads means it cannot hold one shared, mutable
/// [`ResolutionContext`]. Each call to [`Provider::resolve`] /
/// [`Provider::resolve_all`] builds a fresh [`ActiveResolve`] scoped to that
/// one call chain instead.
///
/// # Examples
/// ```
/// use wirebox_core::container::Container;
///
/// let provider = Container::builder().register_instance(7i32).build().unwrap();
/// let value: i32 = provider.resolve().unwrap();
/// assert_eq!(value, 7);
/// provider.dispose().unwrap();
/// ```
pub struct Provider {
    container: Arc<Container>,
    disposables: Arc<Mutex<Vec<Disposer>>>,
    disposed: AtomicBool,
    self_handle: Weak<Provider>,
}

impl Provider {
    pub(crate) fn new(container: Arc<Container>, self_handle: Weak<Provider>) -> Self {
        Self {
            container,
            disposables: Arc::new(Mutex::new(Vec::new())),
            disposed: AtomicBool::new(false),
            self_handle,
        }
    }

    /// The container this provider was built from, mainly for diagnostics
    /// and tests.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolves the last-registered descriptor for `T`. `Arc<Container>` and
    /// `Arc<Provider>` resolve to this provider's bootstrap handles without
    /// needing a matching registration — see the module docs on
    /// [`ActiveResolve::resolve_key`].
    pub fn resolve<T: Send + Sync + Clone + 'static>(&self) -> Result<T> {
        self.check_not_disposed()?;
        let active = ActiveResolve::root(self.container.clone(), self.disposables.clone(), self.self_handle.clone());
        resolver::resolve(&active)
    }

    /// Resolves every registration for `T`, in registration order.
    pub fn resolve_all<T: Send + Sync + Clone + 'static>(&self) -> Result<Vec<T>> {
        self.check_not_disposed()?;
        let active = ActiveResolve::root(self.container.clone(), self.disposables.clone(), self.self_handle.clone());
        resolver::resolve_all(&active)
    }

    /// Creates a new scope sharing this provider's container and its
    /// descriptors' singleton/per-thread caches, but with its own
    /// scoped-instance cache and disposal list.
    pub fn create_scope(&self) -> Result<Arc<Scope>> {
        self.check_not_disposed()?;
        debug!("creating scope");
        Ok(Scope::bootstrap(
            self.container.clone(),
            self.disposables.clone(),
            self.self_handle.clone(),
        ))
    }

    /// Disposes every instance this provider built directly (not through a
    /// scope), in reverse creation order. A second call returns
    /// [`WireError::AlreadyDisposed`] — disposal is one-shot.
    #[instrument(skip(self))]
    pub fn dispose(&self) -> Result<()> {
        self.mark_disposed()?;
        let disposables = std::mem::take(&mut *self.disposables.lock());
        crate::scope::dispose_all_sync(disposables)
    }

    /// Asynchronous counterpart of [`Provider::dispose`]. Disposers
    /// registered via `register_async_disposable`/`register_disposable_both`
    /// run their async teardown; sync-only disposers run synchronously.
    #[cfg(feature = "async")]
    pub async fn dispose_async(&self) -> Result<()> {
        self.mark_disposed()?;
        let disposables = std::mem::take(&mut *self.disposables.lock());
        crate::scope::dispose_all_async(disposables).await
    }

    fn mark_disposed(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Err(WireError::AlreadyDisposed(DisposedTarget::Provider));
        }
        Ok(())
    }

    fn check_not_disposed(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(WireError::AlreadyDisposed(DisposedTarget::Provider));
        }
        Ok(())
    }
}

/// The per-call-chain [`Resolver`] implementation.
///
/// Built fresh for every [`Provider::resolve`] / [`Scope::resolve`] call
/// (and reused, via `&dyn Resolver`, across every nested
/// `resolver.resolve::<Param>()` call within the same chain), so its
/// [`ResolutionContext`] is never shared across threads or unrelated
/// top-level resolves. Holds `Arc`/`Weak` handles rather than borrows so it
/// carries no lifetime parameter of its own.
pub(crate) struct ActiveResolve {
    container: Arc<Container>,
    scope: Option<Arc<Scope>>,
    provider_self: Weak<Provider>,
    /// Where a disposer registered *during this resolve* lands when its
    /// descriptor's lifetime is `Scoped` or `Transient`: the active scope's
    /// list if there is one, the provider's otherwise.
    local_disposables: Arc<Mutex<Vec<Disposer>>>,
    /// Always the provider's own list — `Singleton` and `PerThread`
    /// instances must outlive any scope that happened to trigger their
    /// first construction.
    provider_disposables: Arc<Mutex<Vec<Disposer>>>,
    ctx: RefCell<ResolutionContext>,
}

impl ActiveResolve {
    pub(crate) fn root(
        container: Arc<Container>,
        provider_disposables: Arc<Mutex<Vec<Disposer>>>,
        provider_self: Weak<Provider>,
    ) -> Self {
        Self {
            container,
            scope: None,
            provider_self,
            local_disposables: provider_disposables.clone(),
            provider_disposables,
            ctx: RefCell::new(ResolutionContext::new()),
        }
    }

    pub(crate) fn scoped(
        container: Arc<Container>,
        scope: Arc<Scope>,
        scope_disposables: Arc<Mutex<Vec<Disposer>>>,
        provider_disposables: Arc<Mutex<Vec<Disposer>>>,
        provider_self: Weak<Provider>,
    ) -> Self {
        Self {
            container,
            scope: Some(scope),
            provider_self,
            local_disposables: scope_disposables,
            provider_disposables,
            ctx: RefCell::new(ResolutionContext::new()),
        }
    }

    fn resolve_one(&self, descriptor: &crate::descriptor::Descriptor) -> Result<Arc<dyn Any + Send + Sync>> {
        match descriptor.lifetime() {
            Lifetime::Transient => guarded_build(descriptor, self, &self.ctx),
            Lifetime::Singleton => descriptor.cache_singleton(|| guarded_build(descriptor, self, &self.ctx)),
            Lifetime::PerThread => descriptor.cache_for_thread(|| guarded_build(descriptor, self, &self.ctx)),
            Lifetime::Scoped => match &self.scope {
                Some(scope) => scope.cached_build(descriptor, || guarded_build(descriptor, self, &self.ctx)),
                None if self.container.strict_scoping => {
                    Err(WireError::ScopeRequired(descriptor.service_type().clone()))
                }
                None => guarded_build(descriptor, self, &self.ctx),
            },
        }
    }

    /// Bootstrap self-registrations: `Arc<Container>`, `Arc<Provider>` and
    /// (inside a scope) `Arc<Scope>` resolve to this call's own handles
    /// without a matching [`Descriptor`](crate::descriptor::Descriptor) —
    /// any `Injectable::construct` may declare one as a dependency the same
    /// way it declares any other service type.
    fn bootstrap_instance(&self, key: &DependencyKey) -> Option<Arc<dyn Any + Send + Sync>> {
        if *key == DependencyKey::of::<Arc<Container>>() {
            return Some(Arc::new(self.container.clone()) as Arc<dyn Any + Send + Sync>);
        }
        if *key == DependencyKey::of::<Arc<Provider>>() {
            let provider = self
                .provider_self
                .upgrade()
                .expect("provider outlives any resolve call made through it");
            return Some(Arc::new(provider) as Arc<dyn Any + Send + Sync>);
        }
        if let Some(scope) = &self.scope {
            if *key == DependencyKey::of::<Arc<Scope>>() {
                return Some(Arc::new(scope.clone()) as Arc<dyn Any + Send + Sync>);
            }
        }
        None
    }
}

impl Resolver for ActiveResolve {
    fn resolve_key(&self, key: &DependencyKey) -> Result<Arc<dyn Any + Send + Sync>> {
        if let Some(instance) = self.bootstrap_instance(key) {
            return Ok(instance);
        }
        let descriptor = self
            .container
            .registry
            .get_descriptor(key)
            .ok_or_else(|| not_registered(key, &self.container.registry.registered_keys()))?;
        self.resolve_one(descriptor)
    }

    fn resolve_all_key(&self, key: &DependencyKey) -> Result<Vec<Arc<dyn Any + Send + Sync>>> {
        if let Some(instance) = self.bootstrap_instance(key) {
            return Ok(vec![instance]);
        }
        self.container
            .registry
            .get_descriptors(key)
            .iter()
            .map(|descriptor| self.resolve_one(descriptor))
            .collect()
    }

    fn register_disposer(&self, disposer: Disposer) {
        let lives_beyond_scope = self
            .ctx
            .borrow()
            .current()
            .and_then(|key| self.container.registry.get_descriptor(key))
            .map(|descriptor| matches!(descriptor.lifetime(), Lifetime::Singleton | Lifetime::PerThread))
            .unwrap_or(false);

        if lives_beyond_scope {
            self.provider_disposables.lock().push(disposer);
        } else {
            self.local_disposables.lock().push(disposer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispose::Dispose;
    use crate::introspect::Injectable;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Recorder(Arc<Mutex<Vec<u32>>>, u32);
    impl Dispose for Recorder {
        fn dispose(&self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.lock().push(self.1);
            Ok(())
        }
    }

    #[test]
    fn dispose_runs_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let provider = crate::container::Container::builder()
            .register_factory(Lifetime::Transient, {
                let order = order.clone();
                move |resolver| {
                    resolver.register_disposable(Arc::new(Recorder(order.clone(), 1)));
                    resolver.register_disposable(Arc::new(Recorder(order.clone(), 2)));
                    Ok(())
                }
            })
            .build()
            .unwrap();

        let _: () = provider.resolve().unwrap();
        provider.dispose().unwrap();
        assert_eq!(*order.lock(), vec![2, 1]);
    }

    #[test]
    fn dispose_twice_errors() {
        let provider = crate::container::Container::builder().build().unwrap();
        provider.dispose().unwrap();
        assert!(matches!(
            provider.dispose().unwrap_err(),
            WireError::AlreadyDisposed(DisposedTarget::Provider)
        ));
    }

    #[test]
    fn resolve_after_dispose_fails() {
        let provider = crate::container::Container::builder()
            .register_instance(1i32)
            .build()
            .unwrap();
        provider.dispose().unwrap();
        assert!(matches!(
            provider.resolve::<i32>().unwrap_err(),
            WireError::AlreadyDisposed(DisposedTarget::Provider)
        ));
    }

    #[test]
    fn resolve_all_preserves_registration_order() {
        let provider = crate::container::Container::builder()
            .register_instance(1i32)
            .register_factory(Lifetime::Transient, |_| Ok(2i32))
            .register_factory(Lifetime::Transient, |_| Ok(3i32))
            .build()
            .unwrap();

        let values: Vec<i32> = provider.resolve_all().unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn singleton_built_inside_scope_survives_scope_disposal() {
        let counter = Arc::new(AtomicU32::new(0));
        let provider = crate::container::Container::builder()
            .register_factory(Lifetime::Singleton, {
                let counter = counter.clone();
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(99i32)
                }
            })
            .build()
            .unwrap();

        let scope = provider.create_scope().unwrap();
        let first: i32 = scope.resolve().unwrap();
        scope.dispose().unwrap();

        let second: i32 = provider.resolve().unwrap();
        assert_eq!((first, second), (99, 99));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    struct Greeter {
        name: String,
    }
    impl Injectable for Greeter {
        fn dependencies() -> Vec<DependencyKey> {
            vec![DependencyKey::of::<String>()]
        }
        fn construct(resolver: &dyn Resolver) -> Result<Self> {
            Ok(Greeter {
                name: resolver.resolve()?,
            })
        }
    }

    #[test]
    fn injectable_pulls_its_own_dependency() {
        let provider = crate::container::Container::builder()
            .register_instance(String::from("Ada"))
            .register_type::<Greeter>(Lifetime::Transient)
            .unwrap()
            .build()
            .unwrap();

        let greeter: Greeter = provider.resolve().unwrap();
        assert_eq!(greeter.name, "Ada");
    }

    #[test]
    fn bootstrap_container_and_provider_are_injectable() {
        let provider = crate::container::Container::builder()
            .register_instance(1i32)
            .build()
            .unwrap();

        let container: Arc<Container> = provider.resolve().unwrap();
        assert_eq!(container.registered_count(), 1);

        let self_provider: Arc<Provider> = provider.resolve().unwrap();
        assert!(Arc::ptr_eq(&self_provider, &provider));
    }

    #[test]
    fn bootstrap_scope_is_injectable_only_inside_a_scope() {
        let provider = crate::container::Container::builder().build().unwrap();
        assert!(provider.resolve::<Arc<Scope>>().is_err());

        let scope = provider.create_scope().unwrap();
        let self_scope: Arc<Scope> = scope.resolve().unwrap();
        assert!(Arc::ptr_eq(&self_scope, &scope));
    }
}
