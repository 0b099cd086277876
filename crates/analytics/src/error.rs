use thiserror::Error;

use cafestock_core::{DomainError, ItemId};

use crate::store::StoreError;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors surfaced by the analytics engine.
///
/// Missing prerequisite data (no cost, no sales) is not an error: those
/// sub-results are simply empty.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("no analytics recorded for item {0}")]
    NoAnalyticsHistory(ItemId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to persist analytics for item {item_id}: {source}")]
    Persistence {
        item_id: ItemId,
        #[source]
        source: StoreError,
    },

    #[error("invalid analytics configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AnalyticsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalyticsError::NotFound(_) | AnalyticsError::NoAnalyticsHistory(_))
    }
}
