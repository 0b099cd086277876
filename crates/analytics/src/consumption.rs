use serde::{Deserialize, Serialize};
use tracing::debug;

use cafestock_core::ItemId;
use cafestock_inventory::StockSnapshot;

use crate::clock::days_before;
use crate::context::AnalysisContext;
use crate::error::AnalyticsResult;
use crate::sanitize::Sanitize;
use crate::store::AnalyticsStore;

/// Average daily draw-down over a lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEstimate {
    pub item_id: ItemId,
    pub daily_consumption: f64,
    pub window_days: u32,
}

impl Sanitize for ConsumptionEstimate {
    fn sanitize(&mut self) {
        let ConsumptionEstimate {
            item_id,
            daily_consumption,
            window_days,
        } = self;
        item_id.sanitize();
        daily_consumption.sanitize();
        window_days.sanitize();
    }
}

/// Derives consumption from successive stock counts.
pub struct ConsumptionEstimator<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> ConsumptionEstimator<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    /// Estimate over the last `window_days` days (ending at the context's `now`).
    pub fn estimate(&self, item_id: ItemId, window_days: u32) -> AnalyticsResult<ConsumptionEstimate> {
        let since = days_before(self.ctx.now, window_days);
        let snapshots = self.ctx.store.query_stock_snapshots(item_id, since)?;
        let daily = daily_consumption(&snapshots, window_days);

        debug!(
            item = %item_id,
            snapshots = snapshots.len(),
            window_days,
            daily_consumption = daily,
            "estimated daily consumption"
        );

        Ok(ConsumptionEstimate {
            item_id,
            daily_consumption: daily,
            window_days,
        })
    }
}

/// Sum of stock decreases between adjacent counts, divided by the full window.
///
/// Expects snapshots in ascending time order. Increases are restocks and are
/// skipped, never netted against consumption. The divisor is the requested
/// window even when the counts span fewer days, so young items read low.
pub fn daily_consumption(snapshots: &[StockSnapshot], window_days: u32) -> f64 {
    if snapshots.len() < 2 || window_days == 0 {
        return 0.0;
    }

    let total_decrease: f64 = snapshots
        .windows(2)
        .map(|pair| pair[0].quantity - pair[1].quantity)
        .filter(|drop| *drop > 0.0)
        .sum();

    total_decrease / f64::from(window_days)
}
