//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A rate band or an LTV range is defined entirely by its values; two with the
/// same values are interchangeable. To "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
