//! # The Container — heart of WireBox
//!
//! [`Container`] holds every registration (the [`Registry`]) and the
//! dependency graph cycle check runs against. It is built once via
//! [`ContainerBuilder`] and from then on is read-only — [`ContainerBuilder::build`]
//! hands back a [`Provider`], the object applications actually resolve
//! through.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Provider (owns Container)
//!                                    │
//!                              create_scope()
//!                                    │
//!                                    ▼
//!                                  Scope
//! ```
//!
//! # Examples
//! ```
//! use wirebox_core::container::Container;
//! use wirebox_core::lifetime::Lifetime;
//! use wirebox_core::resolver::Resolver;
//!
//! struct ConsoleLogger;
//!
//! struct UserService {
//!     greeting: String,
//! }
//! impl wirebox_core::introspect::Injectable for UserService {
//!     fn dependencies() -> Vec<wirebox_core::key::DependencyKey> {
//!         vec![wirebox_core::key::DependencyKey::of::<String>()]
//!     }
//!     fn construct(resolver: &dyn Resolver) -> wirebox_core::error::Result<Self> {
//!         Ok(UserService { greeting: resolver.resolve()? })
//!     }
//! }
//!
//! let provider = Container::builder()
//!     .register_instance(String::from("hello"))
//!     .register_type::<UserService>(Lifetime::Transient)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let service: UserService = provider.resolve().unwrap();
//! assert_eq!(service.greeting, "hello");
//! ```

use std::any::Any;
use std::sync::Arc;

use tracing::info;

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::introspect::Injectable;
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::registry::Registry;
use crate::resolver::{check_for_cycle, FactoryFn, Resolver};

/// Builds a [`Container`] with registered dependencies.
///
/// Every `register_*` method appends — re-registering a type already bound
/// is never an error, it adds another entry that [`resolve_all`](crate::resolver::resolve_all)
/// will see and that becomes the new "last wins" entry for a singular
/// resolve.
pub struct ContainerBuilder {
    registry: Registry,
    graph: DependencyGraph,
    strict_scoping: bool,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            graph: DependencyGraph::new(),
            strict_scoping: false,
        }
    }

    /// When `true`, resolving a `Scoped` dependency with no active scope
    /// fails with [`ScopeRequired`](crate::error::WireError::ScopeRequired)
    /// instead of falling through to an uncached, transient-like build. Off
    /// by default.
    pub fn strict_scoping(mut self, strict: bool) -> Self {
        self.strict_scoping = strict;
        self
    }

    /// Registers `I` as its own service type, built via [`Injectable::construct`].
    ///
    /// Dependency edges are recorded into the container's [`DependencyGraph`]
    /// immediately; a registration that would complete a cycle fails here,
    /// not at resolve time.
    pub fn register_type<I: Injectable>(mut self, lifetime: Lifetime) -> Result<Self> {
        let service_type = DependencyKey::of::<I>();
        check_for_cycle(&self.graph, &service_type, I::dependencies())?;

        let compile: Box<dyn Fn() -> FactoryFn + Send + Sync> = Box::new(|| {
            Arc::new(|resolver: &dyn Resolver| -> Result<Arc<dyn Any + Send + Sync>> {
                let instance = I::construct(resolver)?;
                Ok(Arc::new(instance) as Arc<dyn Any + Send + Sync>)
            })
        });

        let descriptor = Descriptor::implementation(service_type, lifetime, I::dependencies(), compile);
        self.registry.register(Arc::new(descriptor));
        Ok(self)
    }

    /// Binds interface type `S` to implementation `I`, via an explicit
    /// unsizing coercion.
    ///
    /// Rust has no generic `I -> dyn S` coercion, so the caller supplies it:
    ///
    /// ```
    /// use std::sync::Arc;
    /// use wirebox_core::container::Container;
    /// use wirebox_core::lifetime::Lifetime;
    /// use wirebox_core::introspect::Injectable;
    /// use wirebox_core::resolver::Resolver;
    ///
    /// trait Logger: Send + Sync {
    ///     fn log(&self, msg: &str);
    /// }
    ///
    /// struct ConsoleLogger;
    /// impl Logger for ConsoleLogger {
    ///     fn log(&self, msg: &str) { println!("{msg}"); }
    /// }
    /// impl Injectable for ConsoleLogger {
    ///     fn dependencies() -> Vec<wirebox_core::key::DependencyKey> { vec![] }
    ///     fn construct(_resolver: &dyn Resolver) -> wirebox_core::error::Result<Self> {
    ///         Ok(ConsoleLogger)
    ///     }
    /// }
    ///
    /// let provider = Container::builder()
    ///     .register_as::<dyn Logger, ConsoleLogger>(Lifetime::Singleton, |c| c as Arc<dyn Logger>)
    ///     .unwrap()
    ///     .build()
    ///     .unwrap();
    /// let logger: Arc<dyn Logger> = provider.resolve().unwrap();
    /// logger.log("hi");
    /// ```
    pub fn register_as<S, I>(mut self, lifetime: Lifetime, coerce: fn(Arc<I>) -> Arc<S>) -> Result<Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        // Keyed by `Arc<S>`, not `S` — `resolve::<T>()` always downcasts to a
        // concrete, `Sized` `T`, and a trait object can only reach that
        // erasure boundary wrapped in something Sized like `Arc`. Dependents
        // declare `DependencyKey::of::<Arc<S>>()` in `Injectable::dependencies`
        // to match.
        let service_type = DependencyKey::of::<Arc<S>>();
        check_for_cycle(&self.graph, &service_type, I::dependencies())?;

        let compile: Box<dyn Fn() -> FactoryFn + Send + Sync> = Box::new(move || {
            Arc::new(move |resolver: &dyn Resolver| -> Result<Arc<dyn Any + Send + Sync>> {
                let instance = Arc::new(I::construct(resolver)?);
                let coerced: Arc<S> = coerce(instance);
                Ok(Arc::new(coerced) as Arc<dyn Any + Send + Sync>)
            })
        });

        let descriptor = Descriptor::implementation(service_type, lifetime, I::dependencies(), compile);
        self.registry.register(Arc::new(descriptor));
        Ok(self)
    }

    /// Registers a user-supplied factory closure. Never walks [`Injectable`]
    /// — the closure resolves its own dependencies through the [`Resolver`]
    /// it receives.
    pub fn register_factory<T: Send + Sync + 'static>(
        mut self,
        lifetime: Lifetime,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        let service_type = DependencyKey::of::<T>();
        let factory_fn: FactoryFn = Arc::new(move |resolver| {
            Ok(Arc::new(factory(resolver)?) as Arc<dyn Any + Send + Sync>)
        });
        self.registry
            .register(Arc::new(Descriptor::user_factory(service_type, lifetime, factory_fn)));
        self
    }

    /// Registers an already-constructed value as a singleton. Never built
    /// through [`Injectable`], never re-built — resolved as-is.
    pub fn register_instance<T: Send + Sync + 'static>(mut self, instance: T) -> Self {
        let service_type = DependencyKey::of::<T>();
        self.registry.register(Arc::new(Descriptor::pre_built(
            service_type,
            Arc::new(instance) as Arc<dyn Any + Send + Sync>,
        )));
        self
    }

    /// Finalises the container into a [`Provider`]. Always succeeds —
    /// cycle and missing-dependency checks already ran at each registration
    /// call; an unregistered dependency only ever fails at resolve time.
    ///
    /// The returned `Arc<Provider>` is not incidental: the bootstrap
    /// self-registrations (any `Injectable::construct` may declare
    /// `Arc<Container>` or `Arc<Provider>` as a dependency, and any factory
    /// running inside a scope may declare `Arc<Scope>`) need a durable handle
    /// to hand back, which a bare `Provider` cannot supply from inside its
    /// own methods.
    pub fn build(self) -> Result<Arc<Provider>> {
        info!(registered = self.registry.len(), "building container");
        let container = Arc::new(Container {
            registry: self.registry,
            graph: self.graph,
            strict_scoping: self.strict_scoping,
        });
        Ok(Arc::new_cyclic(|weak| Provider::new(container, weak.clone())))
    }
}

/// Immutable, thread-safe store of registrations and their dependency graph.
///
/// Owned by a [`Provider`] (and shared with every [`Scope`](crate::scope::Scope)
/// it creates) for the life of the application.
pub struct Container {
    pub(crate) registry: Registry,
    #[allow(dead_code)]
    pub(crate) graph: DependencyGraph,
    pub(crate) strict_scoping: bool,
}

impl Container {
    /// Starts building a new container.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Number of distinct service types registered — the same count shown
    /// by [`Debug`](std::fmt::Debug), exposed for callers that want it
    /// programmatically (diagnostics, tests).
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .finish()
    }
}
