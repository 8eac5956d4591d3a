//! Core container implementation for WireBox.
//!
//! This crate is the resolver engine: registrations ([`registry`]), the
//! dependency graph and cycle detector ([`graph`]), per-lifetime caching
//! ([`descriptor`], [`lifetime`]), the object-safe resolution surface
//! ([`resolver`]), and the two things applications actually hold —
//! [`provider::Provider`] and [`scope::Scope`]. The [`wirebox`](https://docs.rs/wirebox)
//! facade crate re-exports the pieces meant for everyday use.

pub mod container;
pub mod context;
pub mod descriptor;
pub mod dispose;
pub mod error;
pub mod graph;
pub mod introspect;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use container::{Container, ContainerBuilder};
pub use dispose::{AsyncDispose, Dispose, Disposer};
pub use error::{Result, WireError};
pub use introspect::Injectable;
pub use key::DependencyKey;
pub use lifetime::Lifetime;
pub use provider::Provider;
pub use resolver::{resolve, resolve_all, register_disposable, register_async_disposable, register_disposable_both, Resolver};
pub use scope::Scope;
