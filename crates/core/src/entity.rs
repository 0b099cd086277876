//! Entity trait: records that keep their identity while their state changes.

/// Entity marker + minimal interface.
///
/// Inventory items are entities (quantity and last-sale change, the id does
/// not). History rows are append-only and carry a [`crate::RecordId`] instead.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
