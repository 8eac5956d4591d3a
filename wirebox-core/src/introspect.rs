//! Constructor introspection.
//!
//! The specification asks for a `TypeIntrospector` capability that, given an
//! implementation type, enumerates its public constructors and their
//! parameter types — the source this design is distilled from leans on a
//! host runtime's reflection and expression-tree compilation to do this.
//! Rust has neither, so [`Injectable`] is the introspector: the implementer
//! states a type's dependency-parameter types and its construction logic
//! once, and [`FactoryBuilder`](crate::resolver) drives the rest (edge
//! recording, cycle check, closure compilation) exactly as the
//! specification lays out for a runtime-reflection-backed provider.
//!
//! A user factory or a pre-built instance never goes through `Injectable` —
//! those registration kinds carry their own closure or value and skip
//! introspection entirely.

use crate::error::Result;
use crate::key::DependencyKey;
use crate::resolver::Resolver;

/// Declares a type's constructor dependencies and how to build it from a
/// [`Resolver`].
///
/// # Examples
/// ```
/// use wirebox_core::introspect::Injectable;
/// use wirebox_core::key::DependencyKey;
/// use wirebox_core::resolver::Resolver;
/// use wirebox_core::error::Result;
///
/// struct Greeter {
///     name: String,
/// }
///
/// impl Injectable for Greeter {
///     fn dependencies() -> Vec<DependencyKey> {
///         vec![DependencyKey::of::<String>()]
///     }
///
///     fn construct(resolver: &dyn Resolver) -> Result<Self> {
///         let name: String = resolver.resolve()?;
///         Ok(Greeter { name })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The service types this constructor requires, in parameter order.
    /// [`FactoryBuilder`](crate::resolver) records these as dependency-graph
    /// edges before the first instance is ever built.
    fn dependencies() -> Vec<DependencyKey>;

    /// Builds an instance, resolving each of [`Self::dependencies`] through
    /// `resolver`.
    fn construct(resolver: &dyn Resolver) -> Result<Self>;
}
