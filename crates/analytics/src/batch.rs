//! Per-item failure isolation for list and batch operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use cafestock_core::ItemId;
use cafestock_inventory::Item;

use crate::error::AnalyticsResult;
use crate::sanitize::Sanitize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Compute,
    Persist,
}

/// One item that could not be processed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: ItemId,
    pub stage: FailureStage,
    pub reason: String,
}

/// Results of a per-item operation: everything that succeeded plus every failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub failures: Vec<ItemFailure>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Collected<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<T: Sanitize> Sanitize for Collected<T> {
    fn sanitize(&mut self) {
        self.items.sanitize();
    }
}

/// Apply `f` to every item without letting one failure stop the rest.
///
/// `Ok(None)` excludes the item silently (sub-result not applicable);
/// `Err` records an [`ItemFailure`] at the compute stage.
pub fn collect_per_item<T, F>(items: &[Item], operation: &'static str, mut f: F) -> Collected<T>
where
    F: FnMut(&Item) -> AnalyticsResult<Option<T>>,
{
    let mut out = Collected::default();
    for item in items {
        match f(item) {
            Ok(Some(v)) => out.items.push(v),
            Ok(None) => {}
            Err(e) => {
                warn!(operation, item = %item.id, error = %e, "skipping item after analytics failure");
                out.failures.push(ItemFailure {
                    item_id: item.id,
                    stage: FailureStage::Compute,
                    reason: e.to_string(),
                });
            }
        }
    }
    out
}

/// Outcome of one batch update over all active items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateSummary {
    pub persisted_count: usize,
    /// Items that disappeared between listing and computing.
    pub skipped_count: usize,
    pub failed_count: usize,
    pub failures: Vec<ItemFailure>,
    pub timestamp: DateTime<Utc>,
}

impl BatchUpdateSummary {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            persisted_count: 0,
            skipped_count: 0,
            failed_count: 0,
            failures: Vec::new(),
            timestamp,
        }
    }

    pub(crate) fn record_failure(&mut self, item_id: ItemId, stage: FailureStage, reason: String) {
        self.failed_count += 1;
        self.failures.push(ItemFailure { item_id, stage, reason });
    }
}
