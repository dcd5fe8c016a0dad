//! Entity trait: identity + continuity across state changes.

/// Anything with a stable identity (products, orders, reviews).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
