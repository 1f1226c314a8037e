//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. `Money` is the canonical example in this workspace:
//! two amounts with the same number of cents are the same amount.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: compared by their attribute values
/// - **Debug**: useful in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
