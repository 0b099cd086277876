//! Implementations of the analytics store seam.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAnalyticsStore;
pub use postgres::PostgresAnalyticsStore;
