//! Inventory domain module.
//!
//! Business records for the cafe's stock: items, point-in-time stock counts and
//! sales events. Pure domain logic only (no IO, no HTTP, no storage).

pub mod history;
pub mod item;

pub use history::{SalesEvent, StockSnapshot};
pub use item::{Item, NewItem, RecordSale, RecordStockCount};
