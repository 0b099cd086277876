//! Analytics orchestrator: composes every component into one report per item
//! and drives the batch job that persists derived snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use cafestock_core::ItemId;
use cafestock_inventory::Item;

use crate::batch::{BatchUpdateSummary, FailureStage};
use crate::clock::{Clock, SystemClock};
use crate::confidence::ConfidenceScorer;
use crate::config::AnalyticsConfig;
use crate::consumption::ConsumptionEstimator;
use crate::context::AnalysisContext;
use crate::cost::{CostOptimization, CostOptimizer};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::menu::{MenuRecommendation, MenuRecommendationEngine};
use crate::report::AnalyticsReport;
use crate::restock::{RestockDate, RestockPredictor};
use crate::sales::{SalesPerformance, SalesPerformanceAnalyzer};
use crate::sanitize::sanitized;
use crate::snapshot::{AnalyticsSnapshot, MenuRecommendationSnapshot};
use crate::store::AnalyticsStore;

/// Entry point for all analytics over one store.
///
/// Holds no mutable state: concurrent calls (for the same or different items)
/// only share the store.
pub struct AnalyticsEngine<S> {
    store: Arc<S>,
    config: AnalyticsConfig,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for AnalyticsEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S> AnalyticsEngine<S>
where
    S: AnalyticsStore,
{
    /// Build an engine; fails on an invalid configuration.
    pub fn new(store: Arc<S>, config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a read scope pinned to the current instant.
    pub fn context(&self) -> AnalysisContext<'_, S> {
        AnalysisContext::new(self.store.as_ref(), &self.config, self.clock.now())
    }

    pub fn estimate_daily_consumption(&self, item_id: ItemId, window_days: u32) -> AnalyticsResult<f64> {
        let estimate = ConsumptionEstimator::new(self.context()).estimate(item_id, window_days)?;
        Ok(estimate.daily_consumption)
    }

    pub fn confidence_score(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        ConfidenceScorer::new(self.context()).score(item_id)
    }

    pub fn predict_restock_date(&self, item_id: ItemId) -> AnalyticsResult<RestockDate> {
        RestockPredictor::new(self.context()).predict_restock_date(item_id)
    }

    pub fn predict_stock_life(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        RestockPredictor::new(self.context()).predict_stock_life(item_id)
    }

    pub fn predict_optimal_restock_quantity(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        RestockPredictor::new(self.context()).predict_optimal_restock_quantity(item_id)
    }

    pub fn calculate_cost_optimization(&self, item_id: ItemId) -> AnalyticsResult<Option<CostOptimization>> {
        CostOptimizer::new(self.context()).calculate_cost_optimization(item_id)
    }

    pub fn analyze_sales_performance(&self, item_id: ItemId) -> AnalyticsResult<SalesPerformance> {
        SalesPerformanceAnalyzer::new(self.context()).analyze_sales_performance(item_id)
    }

    pub fn generate_menu_recommendations(&self, item_id: ItemId) -> AnalyticsResult<MenuRecommendation> {
        MenuRecommendationEngine::new(self.context()).generate_menu_recommendations(item_id)
    }

    /// Full sanitized report for one item; `NotFound` if the item does not exist.
    pub fn run_full_analytics(&self, item_id: ItemId) -> AnalyticsResult<AnalyticsReport> {
        let ctx = self.context();
        let item = ctx
            .store
            .get_item(item_id)?
            .ok_or(AnalyticsError::NotFound(item_id))?;
        analyze_item(ctx, &item)
    }

    /// Analyze every active item and append one analytics + one menu snapshot each.
    ///
    /// Each item is its own failure domain; only failing to list items aborts the run.
    pub fn update_analytics_for_all_items(&self) -> AnalyticsResult<BatchUpdateSummary> {
        let items = self.store.list_active_items()?;
        let mut summary = BatchUpdateSummary::new(self.clock.now());
        info!(items = items.len(), model_version = %self.config.model_version, "analytics batch update started");

        for item in &items {
            let report = match self.run_full_analytics(item.id) {
                Ok(r) => r,
                Err(AnalyticsError::NotFound(_)) => {
                    debug!(item = %item.id, "item vanished before analysis; skipping");
                    summary.skipped_count += 1;
                    continue;
                }
                Err(e) => {
                    warn!(item = %item.id, error = %e, "analytics computation failed");
                    summary.record_failure(item.id, FailureStage::Compute, e.to_string());
                    continue;
                }
            };

            let analytics = AnalyticsSnapshot::from_report(&report, self.config.model_version.clone());
            let menu = MenuRecommendationSnapshot::from_report(&report);

            match self.store.append_run(&analytics, &menu) {
                Ok(()) => summary.persisted_count += 1,
                Err(source) => {
                    let err = AnalyticsError::Persistence {
                        item_id: item.id,
                        source,
                    };
                    warn!(item = %item.id, error = %err, "analytics persistence failed");
                    summary.record_failure(item.id, FailureStage::Persist, err.to_string());
                }
            }
        }

        info!(
            persisted = summary.persisted_count,
            skipped = summary.skipped_count,
            failed = summary.failed_count,
            "analytics batch update finished"
        );
        Ok(summary)
    }
}

/// One pass over an item's history, shared by every component.
pub(crate) fn analyze_item<S>(ctx: AnalysisContext<'_, S>, item: &Item) -> AnalyticsResult<AnalyticsReport>
where
    S: AnalyticsStore + ?Sized,
{
    let consumption = ConsumptionEstimator::new(ctx).estimate(item.id, ctx.config.consumption_window_days)?;
    let confidence = ConfidenceScorer::new(ctx).score(item.id)?;
    let predictions = RestockPredictor::new(ctx).forecast(item, consumption.daily_consumption, confidence);
    let cost_analysis = CostOptimizer::new(ctx).optimize(item, &predictions);

    let events = ctx.store.query_sales_events(item.id)?;
    let sales_performance = SalesPerformanceAnalyzer::new(ctx).from_events(&events);
    let menu_recommendations = MenuRecommendationEngine::new(ctx).recommend(item, &sales_performance, &events);

    Ok(sanitized(AnalyticsReport {
        item_id: item.id,
        generated_at: ctx.now,
        predictions,
        cost_analysis,
        sales_performance,
        menu_recommendations,
    }))
}
