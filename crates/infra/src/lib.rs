//! Infrastructure layer: store adapters and configuration loading.

pub mod config;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, Settings};
pub use store::{InMemoryAnalyticsStore, PostgresAnalyticsStore};
