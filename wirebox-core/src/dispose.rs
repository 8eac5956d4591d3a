//! Disposal capability traits.
//!
//! The resolver engine works over type-erased `Box<dyn Any + Send + Sync>`
//! values, so it cannot auto-detect whether a freshly constructed instance
//! implements a disposal capability the way a runtime with reflection could.
//! Instead, a factory — the body of an [`Injectable::construct`](crate::introspect::Injectable::construct)
//! or a user factory closure — opts an instance into disposal tracking by
//! calling back into the [`Resolver`](crate::resolver::Resolver) it was
//! handed, the same pattern used by `ferrous-di`'s `register_disposer`.
//!
//! ```ignore
//! fn construct(resolver: &dyn Resolver) -> Result<Self> {
//!     let conn = Arc::new(Connection::open()?);
//!     resolver.register_disposable(conn.clone());
//!     Ok(Self { conn })
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

/// Synchronous teardown for a resolved instance.
///
/// Disposal hooks run in LIFO (reverse creation) order when a [`Scope`](crate::scope::Scope)
/// or [`Provider`](crate::provider::Provider) is disposed.
pub trait Dispose: Send + Sync + 'static {
    /// Performs synchronous cleanup. Errors are collected into a
    /// [`WireError::DisposalAggregate`](crate::error::WireError::DisposalAggregate);
    /// every other disposer still runs.
    fn dispose(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Future type returned by a boxed [`AsyncDispose::dispose`] call.
pub type BoxDisposeFuture =
    Pin<Box<dyn Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send>>;

/// Asynchronous teardown for a resolved instance.
///
/// Preferred over [`Dispose`] when disposing through
/// [`Provider::dispose_async`](crate::provider::Provider::dispose_async) /
/// [`Scope::dispose_async`](crate::scope::Scope::dispose_async); a type that
/// implements both is registered once via [`register_disposable_both`](crate::resolver::register_disposable_both)
/// so it receives exactly one disposal call.
#[async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Performs asynchronous cleanup.
    async fn dispose(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A disposal hook bound to a concrete instance, type-erased so a
/// [`Scope`](crate::scope::Scope) or [`Provider`](crate::provider::Provider)
/// can hold a flat `Vec<Disposer>` regardless of how many distinct types were
/// registered as disposable.
pub enum Disposer {
    Sync(Arc<dyn Dispose>),
    Async(Arc<dyn AsyncDispose>),
    Both(Arc<dyn Dispose>, Arc<dyn AsyncDispose>),
}

impl Disposer {
    pub(crate) fn dispose_sync(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self {
            Disposer::Sync(d) => d.dispose(),
            Disposer::Both(d, _) => d.dispose(),
            Disposer::Async(_) => Ok(()),
        }
    }

    pub(crate) fn dispose_async(&self) -> Option<BoxDisposeFuture> {
        match self {
            Disposer::Async(d) => {
                let d = d.clone();
                Some(Box::pin(async move { d.dispose().await }))
            }
            Disposer::Both(_, d) => {
                let d = d.clone();
                Some(Box::pin(async move { d.dispose().await }))
            }
            Disposer::Sync(_) => None,
        }
    }
}
