//! Storage seam for the analytics engine.
//!
//! The engine only needs a handful of reads plus append-only writes of derived
//! snapshots. Implementations live outside this crate (in-memory, Postgres).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use cafestock_core::ItemId;
use cafestock_inventory::{Item, SalesEvent, StockSnapshot};

use crate::snapshot::{AnalyticsSnapshot, MenuRecommendationSnapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("failed to decode row: {0}")]
    Decode(String),
}

/// Read/append access the analytics engine needs from the data store.
///
/// Ordering contract:
/// - stock snapshots come back ascending by `recorded_at`
/// - sales events come back descending by `sold_at`
pub trait AnalyticsStore: Send + Sync {
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError>;

    fn list_active_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Stock snapshots with `recorded_at >= since`, oldest first.
    fn query_stock_snapshots(
        &self,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StockSnapshot>, StoreError>;

    /// All sales events for the item, newest first.
    fn query_sales_events(&self, item_id: ItemId) -> Result<Vec<SalesEvent>, StoreError>;

    /// Total number of history rows (stock snapshots + sales events) for the item.
    fn count_history(&self, item_id: ItemId) -> Result<usize, StoreError> {
        let snapshots = self.query_stock_snapshots(item_id, DateTime::<Utc>::MIN_UTC)?;
        let sales = self.query_sales_events(item_id)?;
        Ok(snapshots.len() + sales.len())
    }

    fn append_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError>;

    fn append_menu_recommendation(
        &self,
        snapshot: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError>;

    /// Persist the two derived rows of one engine run for one item.
    ///
    /// Stores that support transactions should override this so the pair is
    /// written atomically.
    fn append_run(
        &self,
        analytics: &AnalyticsSnapshot,
        menu: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        self.append_analytics(analytics)?;
        self.append_menu_recommendation(menu)
    }

    fn latest_analytics(&self, item_id: ItemId) -> Result<Option<AnalyticsSnapshot>, StoreError>;

    fn latest_menu_recommendation(
        &self,
        item_id: ItemId,
    ) -> Result<Option<MenuRecommendationSnapshot>, StoreError>;
}

/// Write access for the history-logging operations (stock counts, sales).
///
/// Each call persists the appended row together with the item's new state.
pub trait HistoryStore: AnalyticsStore {
    fn append_stock_count(&self, item: &Item, snapshot: &StockSnapshot) -> Result<(), StoreError>;

    fn append_sale(&self, item: &Item, event: &SalesEvent) -> Result<(), StoreError>;
}

impl<S> AnalyticsStore for Arc<S>
where
    S: AnalyticsStore + ?Sized,
{
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(item_id)
    }

    fn list_active_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_active_items()
    }

    fn query_stock_snapshots(
        &self,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StockSnapshot>, StoreError> {
        (**self).query_stock_snapshots(item_id, since)
    }

    fn query_sales_events(&self, item_id: ItemId) -> Result<Vec<SalesEvent>, StoreError> {
        (**self).query_sales_events(item_id)
    }

    fn count_history(&self, item_id: ItemId) -> Result<usize, StoreError> {
        (**self).count_history(item_id)
    }

    fn append_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        (**self).append_analytics(snapshot)
    }

    fn append_menu_recommendation(
        &self,
        snapshot: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        (**self).append_menu_recommendation(snapshot)
    }

    fn append_run(
        &self,
        analytics: &AnalyticsSnapshot,
        menu: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        (**self).append_run(analytics, menu)
    }

    fn latest_analytics(&self, item_id: ItemId) -> Result<Option<AnalyticsSnapshot>, StoreError> {
        (**self).latest_analytics(item_id)
    }

    fn latest_menu_recommendation(
        &self,
        item_id: ItemId,
    ) -> Result<Option<MenuRecommendationSnapshot>, StoreError> {
        (**self).latest_menu_recommendation(item_id)
    }
}

impl<S> HistoryStore for Arc<S>
where
    S: HistoryStore + ?Sized,
{
    fn append_stock_count(&self, item: &Item, snapshot: &StockSnapshot) -> Result<(), StoreError> {
        (**self).append_stock_count(item, snapshot)
    }

    fn append_sale(&self, item: &Item, event: &SalesEvent) -> Result<(), StoreError> {
        (**self).append_sale(item, event)
    }
}
