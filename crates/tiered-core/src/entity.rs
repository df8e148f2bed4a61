//! The entity capability trait.
//!
//! The engine never looks at concrete domain types. Everything it needs is
//! an identity, used strictly for equality and lookup, and a way to read a
//! comparable value for a named field.

use crate::field::FieldValue;
use std::fmt::Debug;
use std::hash::Hash;

/// A domain object that can appear as a section parent or a section item.
pub trait Entity: Clone {
    /// Stable identity. Two entities with equal ids are the same object,
    /// even if their field values differ.
    type Id: Clone + Eq + Hash + Debug;

    /// The identity of this entity.
    fn id(&self) -> Self::Id;

    /// The value of a named field. Unknown fields read as [`FieldValue::Null`].
    fn field(&self, key: &str) -> FieldValue;
}
