//! Operations exposed to callers (HTTP layer, batch jobs, tooling).
//!
//! Single-item calls surface `NotFound` directly; list calls degrade per item
//! and report failures alongside the successful rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use cafestock_core::ItemId;

use crate::batch::{collect_per_item, BatchUpdateSummary, Collected};
use crate::clock::days_after;
use crate::confidence::ConfidenceScorer;
use crate::consumption::ConsumptionEstimator;
use crate::cost::{CostOptimization, CostOptimizer};
use crate::engine::{analyze_item, AnalyticsEngine};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::menu::{MenuAction, MenuRecommendation, MenuRecommendationEngine};
use crate::report::AnalyticsReport;
use crate::restock::{RestockPrediction, RestockPredictor};
use crate::sales::{SalesPerformance, SalesPerformanceAnalyzer};
use crate::sanitize::{sanitized, Sanitize};
use crate::snapshot::{AnalyticsSnapshot, MenuRecommendationSnapshot};
use crate::store::AnalyticsStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRestockPrediction {
    pub item_id: ItemId,
    pub item_name: String,
    pub current_stock: f64,
    pub restock_threshold: f64,
    #[serde(flatten)]
    pub prediction: RestockPrediction,
}

impl Sanitize for ItemRestockPrediction {
    fn sanitize(&mut self) {
        let ItemRestockPrediction {
            item_id,
            item_name,
            current_stock,
            restock_threshold,
            prediction,
        } = self;
        item_id.sanitize();
        item_name.sanitize();
        current_stock.sanitize();
        restock_threshold.sanitize();
        prediction.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCostOptimization {
    pub item_id: ItemId,
    pub item_name: String,
    #[serde(flatten)]
    pub cost: CostOptimization,
}

impl Sanitize for ItemCostOptimization {
    fn sanitize(&mut self) {
        let ItemCostOptimization { item_id, item_name, cost } = self;
        item_id.sanitize();
        item_name.sanitize();
        cost.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSalesPerformance {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: Option<String>,
    #[serde(flatten)]
    pub performance: SalesPerformance,
}

impl Sanitize for ItemSalesPerformance {
    fn sanitize(&mut self) {
        let ItemSalesPerformance {
            item_id,
            item_name,
            category,
            performance,
        } = self;
        item_id.sanitize();
        item_name.sanitize();
        category.sanitize();
        performance.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMenuRecommendation {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub recommendation: MenuRecommendation,
}

impl Sanitize for ItemMenuRecommendation {
    fn sanitize(&mut self) {
        let ItemMenuRecommendation {
            item_id,
            item_name,
            category,
            is_active,
            recommendation,
        } = self;
        item_id.sanitize();
        item_name.sanitize();
        category.sanitize();
        is_active.sanitize();
        recommendation.sanitize();
    }
}

/// Fleet-wide counters for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub items_needing_restock: usize,
    /// Rounded to cents.
    pub total_daily_cost: f64,
    pub high_performance_items: usize,
    pub items_to_remove: usize,
    /// Items whose analytics failed and were left out of the derived counters.
    pub failed_items: usize,
    pub generated_at: DateTime<Utc>,
}

impl Sanitize for DashboardSummary {
    fn sanitize(&mut self) {
        let DashboardSummary {
            total_items,
            low_stock_items,
            items_needing_restock,
            total_daily_cost,
            high_performance_items,
            items_to_remove,
            failed_items,
            generated_at,
        } = self;
        total_items.sanitize();
        low_stock_items.sanitize();
        items_needing_restock.sanitize();
        total_daily_cost.sanitize();
        high_performance_items.sanitize();
        items_to_remove.sanitize();
        failed_items.sanitize();
        generated_at.sanitize();
    }
}

/// Latest persisted forecast for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsHistory {
    pub item_id: ItemId,
    pub analytics: AnalyticsSnapshot,
    pub menu_optimization: Option<MenuRecommendationSnapshot>,
}

impl<S> AnalyticsEngine<S>
where
    S: AnalyticsStore,
{
    /// Full report for one item; `NotFound` if absent.
    pub fn get_predictions(&self, item_id: ItemId) -> AnalyticsResult<AnalyticsReport> {
        self.run_full_analytics(item_id)
    }

    pub fn list_restock_predictions(&self) -> AnalyticsResult<Collected<ItemRestockPrediction>> {
        let ctx = self.context();
        let items = ctx.store.list_active_items()?;

        let rows = collect_per_item(&items, "list_restock_predictions", |item| {
            let daily = ConsumptionEstimator::new(ctx)
                .estimate(item.id, ctx.config.consumption_window_days)?
                .daily_consumption;
            let score = ConfidenceScorer::new(ctx).score(item.id)?;
            let prediction = RestockPredictor::new(ctx).forecast(item, daily, score);
            Ok(Some(ItemRestockPrediction {
                item_id: item.id,
                item_name: item.name.clone(),
                current_stock: item.quantity,
                restock_threshold: item.restock_threshold,
                prediction,
            }))
        });
        Ok(sanitized(rows))
    }

    /// Items without a cost-per-unit are excluded, not failed.
    pub fn list_cost_optimizations(&self) -> AnalyticsResult<Collected<ItemCostOptimization>> {
        let ctx = self.context();
        let items = ctx.store.list_active_items()?;

        let rows = collect_per_item(&items, "list_cost_optimizations", |item| {
            if item.cost_per_unit.is_none() {
                return Ok(None);
            }
            let daily = ConsumptionEstimator::new(ctx)
                .estimate(item.id, ctx.config.consumption_window_days)?
                .daily_consumption;
            let score = ConfidenceScorer::new(ctx).score(item.id)?;
            let prediction = RestockPredictor::new(ctx).forecast(item, daily, score);
            Ok(CostOptimizer::new(ctx)
                .optimize(item, &prediction)
                .map(|cost| ItemCostOptimization {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    cost,
                }))
        });
        Ok(sanitized(rows))
    }

    pub fn list_sales_performance(&self) -> AnalyticsResult<Collected<ItemSalesPerformance>> {
        let ctx = self.context();
        let items = ctx.store.list_active_items()?;

        let rows = collect_per_item(&items, "list_sales_performance", |item| {
            let performance = SalesPerformanceAnalyzer::new(ctx).analyze_sales_performance(item.id)?;
            Ok(Some(ItemSalesPerformance {
                item_id: item.id,
                item_name: item.name.clone(),
                category: item.category.clone(),
                performance,
            }))
        });
        Ok(sanitized(rows))
    }

    pub fn list_menu_recommendations(&self) -> AnalyticsResult<Collected<ItemMenuRecommendation>> {
        let ctx = self.context();
        let items = ctx.store.list_active_items()?;

        let rows = collect_per_item(&items, "list_menu_recommendations", |item| {
            let events = ctx.store.query_sales_events(item.id)?;
            let perf = SalesPerformanceAnalyzer::new(ctx).from_events(&events);
            let recommendation = MenuRecommendationEngine::new(ctx).recommend(item, &perf, &events);
            Ok(Some(ItemMenuRecommendation {
                item_id: item.id,
                item_name: item.name.clone(),
                category: item.category.clone(),
                is_active: item.is_active,
                recommendation,
            }))
        });
        Ok(sanitized(rows))
    }

    pub fn dashboard_summary(&self) -> AnalyticsResult<DashboardSummary> {
        let ctx = self.context();
        let items = ctx.store.list_active_items()?;
        let restock_deadline = days_after(ctx.now, ctx.config.restock_alert_days);

        let mut summary = DashboardSummary {
            total_items: items.len(),
            low_stock_items: 0,
            items_needing_restock: 0,
            total_daily_cost: 0.0,
            high_performance_items: 0,
            items_to_remove: 0,
            failed_items: 0,
            generated_at: ctx.now,
        };

        for item in &items {
            if item.is_low_stock() {
                summary.low_stock_items += 1;
            }

            let report = match analyze_item(ctx, item) {
                Ok(r) => r,
                Err(e) => {
                    warn!(item = %item.id, error = %e, "dashboard skipped item after analytics failure");
                    summary.failed_items += 1;
                    continue;
                }
            };

            if report.predictions.restock.is_due_by(restock_deadline) {
                summary.items_needing_restock += 1;
            }
            if let Some(cost) = &report.cost_analysis {
                summary.total_daily_cost += cost.daily_cost;
            }
            if report.sales_performance.sales_velocity > ctx.config.high_performance_velocity {
                summary.high_performance_items += 1;
            }
            if report.menu_recommendations.action == MenuAction::Remove {
                summary.items_to_remove += 1;
            }
        }

        summary.total_daily_cost = round_cents(summary.total_daily_cost);
        Ok(sanitized(summary))
    }

    /// Run the batch update now and report its counts.
    pub fn trigger_batch_update(&self) -> AnalyticsResult<BatchUpdateSummary> {
        self.update_analytics_for_all_items()
    }

    /// Most recent persisted snapshots; `NoAnalyticsHistory` if none were ever written.
    pub fn item_analytics_history(&self, item_id: ItemId) -> AnalyticsResult<AnalyticsHistory> {
        let analytics = self
            .store()
            .latest_analytics(item_id)?
            .ok_or(AnalyticsError::NoAnalyticsHistory(item_id))?;
        let menu_optimization = self.store().latest_menu_recommendation(item_id)?;
        Ok(AnalyticsHistory {
            item_id,
            analytics: sanitized(analytics),
            menu_optimization: sanitized(menu_optimization),
        })
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(12.345_6), 12.35);
        assert_eq!(round_cents(0.0), 0.0);
        assert_eq!(round_cents(3.004), 3.0);
    }
}
