use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use cafestock_analytics::{
    AnalyticsSnapshot, AnalyticsStore, HistoryStore, MenuRecommendationSnapshot, StoreError,
};
use cafestock_core::ItemId;
use cafestock_inventory::{Item, SalesEvent, StockSnapshot};

/// In-memory store for tests/dev.
///
/// History tables are append-only vectors; ordering is applied at query time.
#[derive(Debug, Default)]
pub struct InMemoryAnalyticsStore {
    items: RwLock<HashMap<ItemId, Item>>,
    stock: RwLock<Vec<StockSnapshot>>,
    sales: RwLock<Vec<SalesEvent>>,
    analytics: RwLock<Vec<AnalyticsSnapshot>>,
    menu: RwLock<Vec<MenuRecommendationSnapshot>>,
}

impl InMemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn upsert_item(&self, item: Item) -> Result<(), StoreError> {
        write(&self.items, "items")?.insert(item.id, item);
        Ok(())
    }

    /// Seed a raw stock snapshot without touching the item.
    pub fn push_stock_snapshot(&self, snapshot: StockSnapshot) -> Result<(), StoreError> {
        write(&self.stock, "stock_history")?.push(snapshot);
        Ok(())
    }

    /// Seed a raw sales event without touching the item.
    pub fn push_sales_event(&self, event: SalesEvent) -> Result<(), StoreError> {
        write(&self.sales, "sales_history")?.push(event);
        Ok(())
    }

    /// Every persisted analytics snapshot for the item, in append order.
    pub fn analytics_history(&self, item_id: ItemId) -> Vec<AnalyticsSnapshot> {
        match self.analytics.read() {
            Ok(rows) => rows.iter().filter(|s| s.item_id == item_id).cloned().collect(),
            Err(_) => vec![],
        }
    }

    /// Every persisted menu snapshot for the item, in append order.
    pub fn menu_history(&self, item_id: ItemId) -> Vec<MenuRecommendationSnapshot> {
        match self.menu.read() {
            Ok(rows) => rows.iter().filter(|s| s.item_id == item_id).cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn analytics_count(&self) -> usize {
        self.analytics.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn menu_count(&self) -> usize {
        self.menu.read().map(|rows| rows.len()).unwrap_or(0)
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, table: &str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable(format!("{table} lock poisoned")))
}

fn write<'a, T>(lock: &'a RwLock<T>, table: &str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable(format!("{table} lock poisoned")))
}

impl AnalyticsStore for InMemoryAnalyticsStore {
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(read(&self.items, "items")?.get(&item_id).cloned())
    }

    fn list_active_items(&self) -> Result<Vec<Item>, StoreError> {
        let mut items: Vec<Item> = read(&self.items, "items")?
            .values()
            .filter(|i| i.is_active)
            .cloned()
            .collect();
        // UUIDv7 ids sort by creation time.
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    fn query_stock_snapshots(
        &self,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StockSnapshot>, StoreError> {
        let mut rows: Vec<StockSnapshot> = read(&self.stock, "stock_history")?
            .iter()
            .filter(|s| s.item_id == item_id && s.recorded_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.recorded_at);
        Ok(rows)
    }

    fn query_sales_events(&self, item_id: ItemId) -> Result<Vec<SalesEvent>, StoreError> {
        let mut rows: Vec<SalesEvent> = read(&self.sales, "sales_history")?
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        Ok(rows)
    }

    fn count_history(&self, item_id: ItemId) -> Result<usize, StoreError> {
        let stock = read(&self.stock, "stock_history")?
            .iter()
            .filter(|s| s.item_id == item_id)
            .count();
        let sales = read(&self.sales, "sales_history")?
            .iter()
            .filter(|e| e.item_id == item_id)
            .count();
        Ok(stock + sales)
    }

    fn append_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        write(&self.analytics, "item_analytics")?.push(snapshot.clone());
        Ok(())
    }

    fn append_menu_recommendation(
        &self,
        snapshot: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        write(&self.menu, "menu_optimization")?.push(snapshot.clone());
        Ok(())
    }

    fn append_run(
        &self,
        analytics: &AnalyticsSnapshot,
        menu: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        // Take both locks up front so the pair lands together.
        let mut a = write(&self.analytics, "item_analytics")?;
        let mut m = write(&self.menu, "menu_optimization")?;
        a.push(analytics.clone());
        m.push(menu.clone());
        Ok(())
    }

    fn latest_analytics(&self, item_id: ItemId) -> Result<Option<AnalyticsSnapshot>, StoreError> {
        Ok(read(&self.analytics, "item_analytics")?
            .iter()
            .filter(|s| s.item_id == item_id)
            .max_by_key(|s| s.computed_at)
            .cloned())
    }

    fn latest_menu_recommendation(
        &self,
        item_id: ItemId,
    ) -> Result<Option<MenuRecommendationSnapshot>, StoreError> {
        Ok(read(&self.menu, "menu_optimization")?
            .iter()
            .filter(|s| s.item_id == item_id)
            .max_by_key(|s| s.computed_at)
            .cloned())
    }
}

impl HistoryStore for InMemoryAnalyticsStore {
    fn append_stock_count(&self, item: &Item, snapshot: &StockSnapshot) -> Result<(), StoreError> {
        let mut items = write(&self.items, "items")?;
        let mut stock = write(&self.stock, "stock_history")?;
        if !items.contains_key(&item.id) {
            return Err(StoreError::Write(format!("item {} does not exist", item.id)));
        }
        items.insert(item.id, item.clone());
        stock.push(snapshot.clone());
        Ok(())
    }

    fn append_sale(&self, item: &Item, event: &SalesEvent) -> Result<(), StoreError> {
        let mut items = write(&self.items, "items")?;
        let mut sales = write(&self.sales, "sales_history")?;
        if !items.contains_key(&item.id) {
            return Err(StoreError::Write(format!("item {} does not exist", item.id)));
        }
        items.insert(item.id, item.clone());
        sales.push(event.clone());
        Ok(())
    }
}
