//! Dependency identification keys.
//!
//! [`DependencyKey`] uniquely identifies a service type within the container.
//! It wraps a [`TypeId`] plus the type's human-readable name for diagnostics.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Uniquely identifies a service type in the container.
///
/// Two keys are equal iff they carry the same [`TypeId`]. Named/keyed
/// registrations (multiple bindings distinguished by a string name) are not
/// part of this design — see the Non-goals in the specification.
///
/// # Examples
/// ```
/// use wirebox_core::key::DependencyKey;
///
/// let key = DependencyKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// ```
#[derive(Clone)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates a key for type `T`.
    ///
    /// # Examples
    /// ```
    /// use wirebox_core::key::DependencyKey;
    ///
    /// let key = DependencyKey::of::<i32>();
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`DependencyKey::of`] when possible — this exists for the
    /// type-erased registration path where the concrete `T` is not in scope.
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    /// Returns the [`TypeId`] of this dependency.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable type name.
    ///
    /// Used in error messages for better developer experience.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}
