//! Value object marker.
//!
//! Value objects have no identity; two instances with the same attributes
//! are interchangeable. `Money` and cart lines are value objects, orders and
//! reviews are entities.

/// Marker trait for immutable, compared-by-value domain types.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
