use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafestock_core::{DomainError, DomainResult, Entity, ItemId};

use crate::history::{SalesEvent, StockSnapshot};

/// An inventory item as tracked by the cafe.
///
/// Current `quantity` always mirrors the most recent stock count; sales do not
/// draw it down (consumption is derived from successive counts instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub quantity: f64,
    pub restock_threshold: f64,
    pub cost_per_unit: Option<f64>,
    pub is_active: bool,
    pub last_sale_at: Option<DateTime<Utc>>,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: NewItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub quantity: f64,
    pub restock_threshold: f64,
    pub cost_per_unit: Option<f64>,
}

/// Command: RecordStockCount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordStockCount {
    pub item_id: ItemId,
    pub quantity: f64,
    pub notes: Option<String>,
    pub staff_name: Option<String>,
    pub counted_at: DateTime<Utc>,
}

/// Command: RecordSale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSale {
    pub item_id: ItemId,
    pub quantity_sold: f64,
    pub revenue: Option<f64>,
    pub notes: Option<String>,
    pub sold_at: DateTime<Utc>,
}

impl Item {
    /// Validate a `NewItem` command and build an active item with a fresh id.
    pub fn create(cmd: NewItem) -> DomainResult<Self> {
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative("quantity", cmd.quantity)?;
        ensure_non_negative("restock_threshold", cmd.restock_threshold)?;
        if let Some(cost) = cmd.cost_per_unit {
            ensure_non_negative("cost_per_unit", cost)?;
        }

        Ok(Self {
            id: ItemId::new(),
            name: cmd.name,
            unit: cmd.unit,
            category: cmd.category,
            quantity: cmd.quantity,
            restock_threshold: cmd.restock_threshold,
            cost_per_unit: cmd.cost_per_unit,
            is_active: true,
            last_sale_at: None,
        })
    }

    /// At or below the restock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.restock_threshold
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Record an observed stock level.
    ///
    /// The count replaces the current quantity and yields the history row to append.
    pub fn record_stock_count(&mut self, cmd: &RecordStockCount) -> DomainResult<StockSnapshot> {
        self.ensure_item_id(cmd.item_id)?;
        ensure_non_negative("quantity", cmd.quantity)?;

        let mut snapshot = StockSnapshot::new(self.id, cmd.quantity, cmd.counted_at);
        snapshot.notes = cmd.notes.clone();
        snapshot.staff_name = cmd.staff_name.clone();

        self.quantity = cmd.quantity;
        Ok(snapshot)
    }

    /// Record a sale and advance the last-sale timestamp.
    ///
    /// A backdated sale never moves `last_sale_at` backwards.
    pub fn record_sale(&mut self, cmd: &RecordSale) -> DomainResult<SalesEvent> {
        self.ensure_item_id(cmd.item_id)?;
        if !(cmd.quantity_sold.is_finite() && cmd.quantity_sold > 0.0) {
            return Err(DomainError::validation("quantity_sold must be a finite positive number"));
        }
        if let Some(revenue) = cmd.revenue {
            ensure_non_negative("revenue", revenue)?;
        }

        let mut event = SalesEvent::new(self.id, cmd.quantity_sold, cmd.sold_at);
        event.revenue = cmd.revenue;
        event.notes = cmd.notes.clone();

        self.last_sale_at = Some(match self.last_sale_at {
            Some(prev) if prev > cmd.sold_at => prev,
            _ => cmd.sold_at,
        });
        Ok(event)
    }

    fn ensure_item_id(&self, item_id: ItemId) -> DomainResult<()> {
        if *self.id() != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }
}

fn ensure_non_negative(field: &str, value: f64) -> DomainResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(DomainError::validation(format!(
            "{field} must be a finite non-negative number"
        )));
    }
    Ok(())
}
