//! History logging: stock counts and sales.
//!
//! These are the only operations that mutate an item; the analytics
//! components themselves never do.

use tracing::info;

use cafestock_inventory::{RecordSale, RecordStockCount, SalesEvent, StockSnapshot};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::store::HistoryStore;

/// Append a stock count and set the item's current quantity to it.
pub fn record_stock_count<S>(store: &S, cmd: &RecordStockCount) -> AnalyticsResult<StockSnapshot>
where
    S: HistoryStore + ?Sized,
{
    let mut item = store
        .get_item(cmd.item_id)?
        .ok_or(AnalyticsError::NotFound(cmd.item_id))?;
    let snapshot = item.record_stock_count(cmd)?;
    store.append_stock_count(&item, &snapshot)?;
    info!(item = %item.id, quantity = snapshot.quantity, "stock count recorded");
    Ok(snapshot)
}

/// Append a sale and advance the item's last-sale timestamp.
pub fn record_sale<S>(store: &S, cmd: &RecordSale) -> AnalyticsResult<SalesEvent>
where
    S: HistoryStore + ?Sized,
{
    let mut item = store
        .get_item(cmd.item_id)?
        .ok_or(AnalyticsError::NotFound(cmd.item_id))?;
    let event = item.record_sale(cmd)?;
    store.append_sale(&item, &event)?;
    info!(item = %item.id, quantity_sold = event.quantity_sold, "sale recorded");
    Ok(event)
}
