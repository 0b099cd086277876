use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafestock_core::ItemId;

use crate::cost::CostOptimization;
use crate::menu::MenuRecommendation;
use crate::restock::RestockPrediction;
use crate::sales::SalesPerformance;
use crate::sanitize::Sanitize;

/// Everything the engine knows about one item at one instant.
///
/// Returned sanitized: every float is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub item_id: ItemId,
    pub generated_at: DateTime<Utc>,
    pub predictions: RestockPrediction,
    /// `None` when the item has no cost-per-unit.
    pub cost_analysis: Option<CostOptimization>,
    pub sales_performance: SalesPerformance,
    pub menu_recommendations: MenuRecommendation,
}

impl Sanitize for AnalyticsReport {
    fn sanitize(&mut self) {
        let AnalyticsReport {
            item_id,
            generated_at,
            predictions,
            cost_analysis,
            sales_performance,
            menu_recommendations,
        } = self;
        item_id.sanitize();
        generated_at.sanitize();
        predictions.sanitize();
        cost_analysis.sanitize();
        sales_performance.sanitize();
        menu_recommendations.sanitize();
    }
}
