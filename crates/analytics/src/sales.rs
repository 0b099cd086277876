use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cafestock_core::ItemId;
use cafestock_inventory::SalesEvent;

use crate::clock::days_before;
use crate::context::AnalysisContext;
use crate::error::AnalyticsResult;
use crate::sanitize::Sanitize;
use crate::store::AnalyticsStore;

/// Direction of recent sales against the preceding window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesTrend {
    Increasing,
    /// Also used for ties.
    Decreasing,
    NoData,
}

impl SalesTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesTrend::Increasing => "increasing",
            SalesTrend::Decreasing => "decreasing",
            SalesTrend::NoData => "no_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPerformance {
    /// Units per day since the earliest recorded sale.
    pub sales_velocity: f64,
    pub trend: SalesTrend,
    pub total_sales: f64,
    pub recent_sales: f64,
    pub previous_sales: f64,
}

impl SalesPerformance {
    pub fn no_data() -> Self {
        Self {
            sales_velocity: 0.0,
            trend: SalesTrend::NoData,
            total_sales: 0.0,
            recent_sales: 0.0,
            previous_sales: 0.0,
        }
    }
}

impl Sanitize for SalesPerformance {
    fn sanitize(&mut self) {
        let SalesPerformance {
            sales_velocity,
            trend: _,
            total_sales,
            recent_sales,
            previous_sales,
        } = self;
        sales_velocity.sanitize();
        total_sales.sanitize();
        recent_sales.sanitize();
        previous_sales.sanitize();
    }
}

pub struct SalesPerformanceAnalyzer<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> SalesPerformanceAnalyzer<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    pub fn analyze_sales_performance(&self, item_id: ItemId) -> AnalyticsResult<SalesPerformance> {
        let events = self.ctx.store.query_sales_events(item_id)?;
        let perf = self.from_events(&events);
        debug!(
            item = %item_id,
            events = events.len(),
            velocity = perf.sales_velocity,
            trend = perf.trend.as_str(),
            "analyzed sales performance"
        );
        Ok(perf)
    }

    /// Performance over already-loaded events; no store access.
    pub fn from_events(&self, events: &[SalesEvent]) -> SalesPerformance {
        sales_performance(events, self.ctx.now, self.ctx.config.trend_window_days)
    }
}

/// Velocity and trend for a set of sales events (any order).
///
/// Trend compares `[now - w, ..)` against `[now - 2w, now - w)`; a strict
/// increase is `Increasing`, anything else (ties included) is `Decreasing`.
pub fn sales_performance(events: &[SalesEvent], now: DateTime<Utc>, trend_window_days: u32) -> SalesPerformance {
    let Some(earliest) = events.iter().map(|e| e.sold_at).min() else {
        return SalesPerformance::no_data();
    };

    let total_sales: f64 = events.iter().map(|e| e.quantity_sold).sum();
    let days_since_first_sale = (now - earliest).num_days().max(1);
    let sales_velocity = total_sales / days_since_first_sale as f64;

    let recent_start = days_before(now, trend_window_days);
    let previous_start = days_before(recent_start, trend_window_days);

    let recent_sales: f64 = events
        .iter()
        .filter(|e| e.sold_at >= recent_start)
        .map(|e| e.quantity_sold)
        .sum();
    let previous_sales: f64 = events
        .iter()
        .filter(|e| e.sold_at >= previous_start && e.sold_at < recent_start)
        .map(|e| e.quantity_sold)
        .sum();

    let trend = if recent_sales > previous_sales {
        SalesTrend::Increasing
    } else {
        SalesTrend::Decreasing
    };

    SalesPerformance {
        sales_velocity,
        trend,
        total_sales,
        recent_sales,
        previous_sales,
    }
}

/// Whole days since the newest event, if any.
pub fn days_since_last_sale(events: &[SalesEvent], now: DateTime<Utc>) -> Option<i64> {
    events
        .iter()
        .map(|e| e.sold_at)
        .max()
        .map(|last| (now - last).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 18, 0, 0).unwrap()
    }

    fn sale(item_id: ItemId, days_ago: i64, qty: f64) -> SalesEvent {
        SalesEvent::new(item_id, qty, now() - Duration::days(days_ago))
    }

    #[test]
    fn no_events_means_no_data() {
        let perf = sales_performance(&[], now(), 30);
        assert_eq!(perf, SalesPerformance::no_data());
        assert_eq!(perf.trend, SalesTrend::NoData);
    }

    #[test]
    fn velocity_uses_days_since_earliest_sale() {
        let id = ItemId::new();
        let events = vec![sale(id, 1, 10.0), sale(id, 10, 20.0)];
        let perf = sales_performance(&events, now(), 30);
        assert_eq!(perf.total_sales, 30.0);
        assert_eq!(perf.sales_velocity, 3.0);
    }

    #[test]
    fn trend_window_beyond_calendar_range_saturates() {
        let id = ItemId::new();
        let events = vec![sale(id, 5, 4.0), sale(id, 400, 6.0)];
        let perf = sales_performance(&events, now(), u32::MAX);
        assert_eq!(perf.recent_sales, 10.0);
        assert_eq!(perf.previous_sales, 0.0);
        assert_eq!(perf.trend, SalesTrend::Increasing);
    }

    #[test]
    fn same_day_sales_divide_by_one() {
        let id = ItemId::new();
        let events = vec![SalesEvent::new(id, 7.0, now())];
        assert_eq!(sales_performance(&events, now(), 30).sales_velocity, 7.0);
    }

    #[test]
    fn trend_increasing_when_recent_exceeds_previous() {
        let id = ItemId::new();
        let events = vec![sale(id, 5, 12.0), sale(id, 45, 10.0)];
        let perf = sales_performance(&events, now(), 30);
        assert_eq!(perf.recent_sales, 12.0);
        assert_eq!(perf.previous_sales, 10.0);
        assert_eq!(perf.trend, SalesTrend::Increasing);
    }

    #[test]
    fn ties_classify_as_decreasing() {
        let id = ItemId::new();
        let events = vec![sale(id, 5, 10.0), sale(id, 45, 10.0)];
        assert_eq!(sales_performance(&events, now(), 30).trend, SalesTrend::Decreasing);
    }

    #[test]
    fn sales_older_than_two_windows_do_not_count_toward_trend() {
        let id = ItemId::new();
        let events = vec![sale(id, 10, 1.0), sale(id, 75, 500.0)];
        let perf = sales_performance(&events, now(), 30);
        assert_eq!(perf.previous_sales, 0.0);
        assert_eq!(perf.trend, SalesTrend::Increasing);
        assert_eq!(perf.total_sales, 501.0);
    }

    #[test]
    fn days_since_last_sale_uses_newest_event() {
        let id = ItemId::new();
        let events = vec![sale(id, 3, 1.0), sale(id, 40, 1.0)];
        assert_eq!(days_since_last_sale(&events, now()), Some(3));
        assert_eq!(days_since_last_sale(&[], now()), None);
    }
}
