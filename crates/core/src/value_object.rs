//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. An
/// [`AccountIdentity`](crate::AccountIdentity) built twice from the same four
/// key fields is the same account; an [`AccountBalance`](crate::AccountBalance)
/// recomputed from the same entry log snapshot is the same balance.
///
/// ## Immutability
///
/// Once created, a value object doesn't change. To "modify" one, build a new
/// one. This keeps them safe to share across concurrent balance queries.
///
/// The trait requires:
/// - **Clone**: values are copied, not referenced
/// - **PartialEq**: values are compared by their attributes
/// - **Debug**: values show up in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
