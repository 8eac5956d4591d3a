//! Scoped resolution — one instance per scope, e.g. per request.
//!
//! A [`Scope`] shares its parent [`Provider`](crate::provider::Provider)'s
//! container (so `Singleton`/`PerThread` caches still apply), but owns its
//! own per-key cache for [`Lifetime::Scoped`](crate::lifetime::Lifetime::Scoped)
//! registrations and its own disposal list. `Scope::create_scope` produces a
//! flat sibling rather than a nested child: this design does not give scopes
//! a parent/child hierarchy, only a single level under the provider that
//! created them.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::instrument;

use crate::container::Container;
use crate::descriptor::Descriptor;
use crate::dispose::Disposer;
use crate::error::{DisposalError, DisposedTarget, Result, WireError};
use crate::key::DependencyKey;
use crate::provider::{ActiveResolve, Provider};
use crate::resolver;

/// A per-scope instance cache plus disposal list, sharing its container with
/// the [`Provider`](crate::provider::Provider) that created it.
///
/// Built with a [`Weak`] self-handle (see [`Scope::bootstrap`]) so it can
/// hand out `Arc<Scope>` to its own factories — the same bootstrap
/// self-registration contract `Provider` supports for `Arc<Container>` and
/// `Arc<Provider>`.
pub struct Scope {
    container: Arc<Container>,
    cache: DashMap<DependencyKey, Arc<OnceCell<Arc<dyn Any + Send + Sync>>>>,
    disposables: Arc<Mutex<Vec<Disposer>>>,
    provider_disposables: Arc<Mutex<Vec<Disposer>>>,
    disposed: AtomicBool,
    self_handle: Weak<Scope>,
    provider_self: Weak<Provider>,
}

impl Scope {
    pub(crate) fn bootstrap(
        container: Arc<Container>,
        provider_disposables: Arc<Mutex<Vec<Disposer>>>,
        provider_self: Weak<Provider>,
    ) -> Arc<Scope> {
        Arc::new_cyclic(|weak| Scope {
            container,
            cache: DashMap::new(),
            disposables: Arc::new(Mutex::new(Vec::new())),
            provider_disposables,
            disposed: AtomicBool::new(false),
            self_handle: weak.clone(),
            provider_self,
        })
    }

    /// Resolves the last-registered descriptor for `T`, using this scope's
    /// cache for any `Scoped` dependency along the way.
    pub fn resolve<T: Send + Sync + Clone + 'static>(&self) -> Result<T> {
        self.check_not_disposed()?;
        let active = self.active_resolve();
        resolver::resolve(&active)
    }

    /// Resolves every registration for `T`, in registration order.
    pub fn resolve_all<T: Send + Sync + Clone + 'static>(&self) -> Result<Vec<T>> {
        self.check_not_disposed()?;
        let active = self.active_resolve();
        resolver::resolve_all(&active)
    }

    /// Creates a flat sibling scope — it shares the same parent provider's
    /// singleton/per-thread caches and disposal list, but has its own,
    /// independent scoped-instance cache and disposal list.
    pub fn create_scope(&self) -> Result<Arc<Scope>> {
        self.check_not_disposed()?;
        Ok(Scope::bootstrap(
            self.container.clone(),
            self.provider_disposables.clone(),
            self.provider_self.clone(),
        ))
    }

    fn active_resolve(&self) -> ActiveResolve {
        let scope = self
            .self_handle
            .upgrade()
            .expect("scope outlives any resolve call made through it");
        ActiveResolve::scoped(
            self.container.clone(),
            scope,
            self.disposables.clone(),
            self.provider_disposables.clone(),
            self.provider_self.clone(),
        )
    }

    /// Gets or builds the scoped instance for `descriptor`, atomically: two
    /// concurrent resolves racing for the same key both reach the same
    /// `OnceCell` and only one runs `build`.
    pub(crate) fn cached_build(
        &self,
        descriptor: &Descriptor,
        build: impl FnOnce() -> Result<Arc<dyn Any + Send + Sync>>,
    ) -> Result<Arc<dyn Any + Send + Sync>> {
        let cell = self
            .cache
            .entry(descriptor.service_type().clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        cell.get_or_try_init(build).cloned()
    }

    /// Disposes every instance this scope built, in reverse creation order.
    /// Does not touch the parent provider's disposables — those are routed
    /// there at registration time for `Singleton`/`PerThread` lifetimes and
    /// outlive this scope.
    #[instrument(skip(self))]
    pub fn dispose(&self) -> Result<()> {
        self.mark_disposed()?;
        let disposables = std::mem::take(&mut *self.disposables.lock());
        dispose_all_sync(disposables)
    }

    /// Asynchronous counterpart of [`Scope::dispose`].
    #[cfg(feature = "async")]
    pub async fn dispose_async(&self) -> Result<()> {
        self.mark_disposed()?;
        let disposables = std::mem::take(&mut *self.disposables.lock());
        dispose_all_async(disposables).await
    }

    fn mark_disposed(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Err(WireError::AlreadyDisposed(DisposedTarget::Scope));
        }
        Ok(())
    }

    fn check_not_disposed(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(WireError::AlreadyDisposed(DisposedTarget::Scope));
        }
        Ok(())
    }
}

/// Runs every disposer's synchronous teardown in LIFO order. Every disposer
/// is attempted regardless of earlier failures; failures are collected
/// rather than aborting the pass.
pub(crate) fn dispose_all_sync(disposables: Vec<Disposer>) -> Result<()> {
    let mut errors = Vec::new();
    for disposer in disposables.into_iter().rev() {
        if let Err(source) = disposer.dispose_sync() {
            errors.push(DisposalError {
                key: DependencyKey::of::<()>(),
                source,
            });
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(WireError::DisposalAggregate { errors })
    }
}

/// Async counterpart of [`dispose_all_sync`]. A disposer registered as
/// sync-only still runs (inline, synchronously) so nothing is skipped just
/// because teardown went through the async path.
#[cfg(feature = "async")]
pub(crate) fn dispose_all_async(
    disposables: Vec<Disposer>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
    Box::pin(async move {
        let mut errors = Vec::new();
        for disposer in disposables.into_iter().rev() {
            let outcome = match disposer.dispose_async() {
                Some(future) => future.await,
                None => disposer.dispose_sync(),
            };
            if let Err(source) = outcome {
                errors.push(DisposalError {
                    key: DependencyKey::of::<()>(),
                    source,
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WireError::DisposalAggregate { errors })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::dispose::Dispose;
    use crate::lifetime::Lifetime;
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

    #[test]
    fn scoped_instance_is_shared_within_a_scope() {
        let counter = Arc::new(AtomicU32::new(0));
        let provider = Container::builder()
            .register_factory(Lifetime::Scoped, {
                let counter = counter.clone();
                move |_| {
                    counter.fetch_add(1, AtomicOrdering::SeqCst);
                    Ok(1i32)
                }
            })
            .build()
            .unwrap();

        let scope = provider.create_scope().unwrap();
        let _a: i32 = scope.resolve().unwrap();
        let _b: i32 = scope.resolve().unwrap();
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn sibling_scopes_do_not_share_scoped_instances() {
        let counter = Arc::new(AtomicU32::new(0));
        let provider = Container::builder()
            .register_factory(Lifetime::Scoped, {
                let counter = counter.clone();
                move |_| Ok(counter.fetch_add(1, AtomicOrdering::SeqCst))
            })
            .build()
            .unwrap();

        let scope_a = provider.create_scope().unwrap();
        let scope_b = provider.create_scope().unwrap();
        let a: u32 = scope_a.resolve().unwrap();
        let b: u32 = scope_b.resolve().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn scoped_without_active_scope_builds_uncached() {
        let counter = Arc::new(AtomicU32::new(0));
        let provider = Container::builder()
            .register_factory(Lifetime::Scoped, {
                let counter = counter.clone();
                move |_| Ok(counter.fetch_add(1, AtomicOrdering::SeqCst))
            })
            .build()
            .unwrap();

        let a: u32 = provider.resolve().unwrap();
        let b: u32 = provider.resolve().unwrap();
        assert_ne!(a, b);
    }

    struct Recorder(Arc<Mutex<Vec<&'static str>>>, &'static str);
    impl Dispose for Recorder {
        fn dispose(&self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.lock().push(self.1);
            Ok(())
        }
    }

    #[test]
    fn scope_dispose_only_tears_down_its_own_instances() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let provider = Container::builder()
            .register_factory(Lifetime::Singleton, {
                let order = order.clone();
                move |resolver| {
                    resolver.register_disposable(Arc::new(Recorder(order.clone(), "singleton")));
                    Ok(1i32)
                }
            })
            .register_factory(Lifetime::Scoped, {
                let order = order.clone();
                move |resolver| {
                    resolver.register_disposable(Arc::new(Recorder(order.clone(), "scoped")));
                    Ok(2i64)
                }
            })
            .build()
            .unwrap();

        let scope = provider.create_scope().unwrap();
        let _: i32 = scope.resolve().unwrap();
        let _: i64 = scope.resolve().unwrap();

        scope.dispose().unwrap();
        assert_eq!(*order.lock(), vec!["scoped"]);

        provider.dispose().unwrap();
        assert_eq!(*order.lock(), vec!["scoped", "singleton"]);
    }

    #[test]
    fn dispose_twice_errors() {
        let provider = Container::builder().build().unwrap();
        let scope = provider.create_scope().unwrap();
        scope.dispose().unwrap();
        assert!(matches!(
            scope.dispose().unwrap_err(),
            WireError::AlreadyDisposed(DisposedTarget::Scope)
        ));
    }

    #[test]
    fn bootstrap_container_provider_and_scope_are_injectable_inside_a_scope() {
        let provider = Container::builder().build().unwrap();
        let scope = provider.create_scope().unwrap();

        let container: Arc<Container> = scope.resolve().unwrap();
        assert_eq!(container.registered_count(), 0);

        let provider_handle: Arc<Provider> = scope.resolve().unwrap();
        assert!(Arc::ptr_eq(&provider_handle, &provider));

        let scope_handle: Arc<Scope> = scope.resolve().unwrap();
        assert!(Arc::ptr_eq(&scope_handle, &scope));
    }
}
