//! `cafestock-core`: shared building blocks for the cafe inventory workspace.
//!
//! Pure primitives only: identifiers, the domain error model, and the entity
//! marker. No storage, no clocks, no IO.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, RecordId};
