//! Append-only history records.
//!
//! Both record kinds are immutable once created. A stock snapshot is an
//! observed absolute level, never a delta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafestock_core::{ItemId, RecordId};

/// A point-in-time stock count for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub id: RecordId,
    pub item_id: ItemId,
    pub quantity: f64,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub staff_name: Option<String>,
}

impl StockSnapshot {
    pub fn new(item_id: ItemId, quantity: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            item_id,
            quantity,
            recorded_at,
            notes: None,
            staff_name: None,
        }
    }
}

/// A single sale of some quantity of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEvent {
    pub id: RecordId,
    pub item_id: ItemId,
    pub quantity_sold: f64,
    pub sold_at: DateTime<Utc>,
    pub revenue: Option<f64>,
    pub notes: Option<String>,
}

impl SalesEvent {
    pub fn new(item_id: ItemId, quantity_sold: f64, sold_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            item_id,
            quantity_sold,
            sold_at,
            revenue: None,
            notes: None,
        }
    }
}
