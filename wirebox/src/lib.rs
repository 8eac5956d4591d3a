//! # WireBox — a dependency-injection container for Rust
//!
//! A small IoC container: register implementations, factories, or
//! already-built instances, give each a [`Lifetime`], and resolve them
//! through a [`Provider`] or a request/session-scoped [`Scope`]. Dependency
//! cycles are rejected at registration time, before any factory ever runs.
//!
//! # Quick start
//! ```
//! use wirebox::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) {
//!         println!("[LOG] {msg}");
//!     }
//! }
//! impl Injectable for ConsoleLogger {
//!     fn dependencies() -> Vec<DependencyKey> { vec![] }
//!     fn construct(_resolver: &dyn Resolver) -> Result<Self> { Ok(ConsoleLogger) }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//! impl Injectable for UserService {
//!     fn dependencies() -> Vec<DependencyKey> {
//!         vec![DependencyKey::of::<Arc<dyn Logger>>()]
//!     }
//!     fn construct(resolver: &dyn Resolver) -> Result<Self> {
//!         Ok(UserService { logger: resolver.resolve()? })
//!     }
//! }
//!
//! let provider = Container::builder()
//!     .register_as::<dyn Logger, ConsoleLogger>(Lifetime::Singleton, |c| c as Arc<dyn Logger>)
//!     .unwrap()
//!     .register_type::<UserService>(Lifetime::Transient)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let service: UserService = provider.resolve().unwrap();
//! service.logger.log("it works");
//! ```
//!
//! # Scopes
//! ```
//! use wirebox::prelude::*;
//!
//! let provider = Container::builder()
//!     .register_factory(Lifetime::Scoped, |_| Ok(String::from("per-request state")))
//!     .build()
//!     .unwrap();
//!
//! let scope = provider.create_scope().unwrap();
//! let a: String = scope.resolve().unwrap();
//! let b: String = scope.resolve().unwrap();
//! assert_eq!(a, b); // same instance within the scope
//! scope.dispose().unwrap();
//! ```

pub use wirebox_core::container::{Container, ContainerBuilder};
pub use wirebox_core::context::ResolutionContext;
pub use wirebox_core::descriptor::Descriptor;
pub use wirebox_core::dispose::{AsyncDispose, Dispose, Disposer};
pub use wirebox_core::error::{
    CircularDependencyError, DisposalError, DisposedTarget, NotRegisteredError, Result, WireError,
};
pub use wirebox_core::graph::DependencyGraph;
pub use wirebox_core::introspect::Injectable;
pub use wirebox_core::key::DependencyKey;
pub use wirebox_core::lifetime::Lifetime;
pub use wirebox_core::provider::Provider;
pub use wirebox_core::resolver::{
    register_async_disposable, register_disposable, register_disposable_both, resolve, resolve_all, Resolver,
};
pub use wirebox_core::scope::Scope;
pub use wirebox_support::rendering;

/// Glob-importable surface for the common case: `use wirebox::prelude::*;`.
pub mod prelude {
    pub use crate::{
        Container, ContainerBuilder, DependencyKey, Injectable, Lifetime, Provider, Resolver, Result, Scope,
        WireError,
    };
}
