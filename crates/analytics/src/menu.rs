use core::str::FromStr;

use serde::{Deserialize, Serialize};

use cafestock_core::{DomainError, ItemId};
use cafestock_inventory::{Item, SalesEvent};

use crate::config::AnalyticsConfig;
use crate::context::AnalysisContext;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::sales::{days_since_last_sale, SalesPerformance, SalesPerformanceAnalyzer, SalesTrend};
use crate::sanitize::Sanitize;
use crate::store::AnalyticsStore;

/// Days-since-last-sale reported for items that never sold.
pub const NEVER_SOLD_DAYS: i64 = 999;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    Keep,
    Reduce,
    Remove,
    Increase,
}

impl MenuAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuAction::Keep => "keep",
            MenuAction::Reduce => "reduce",
            MenuAction::Remove => "remove",
            MenuAction::Increase => "increase",
        }
    }
}

impl core::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(MenuAction::Keep),
            "reduce" => Ok(MenuAction::Reduce),
            "remove" => Ok(MenuAction::Remove),
            "increase" => Ok(MenuAction::Increase),
            other => Err(DomainError::validation(format!("unknown menu action: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuRecommendation {
    #[serde(rename = "recommendation")]
    pub action: MenuAction,
    pub confidence: f64,
    pub reasoning: String,
    pub days_since_last_sale: i64,
    pub sales_velocity: f64,
}

impl Sanitize for MenuRecommendation {
    fn sanitize(&mut self) {
        let MenuRecommendation {
            action: _,
            confidence,
            reasoning,
            days_since_last_sale,
            sales_velocity,
        } = self;
        confidence.sanitize();
        reasoning.sanitize();
        days_since_last_sale.sanitize();
        sales_velocity.sanitize();
    }
}

pub struct MenuRecommendationEngine<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> MenuRecommendationEngine<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    pub fn generate_menu_recommendations(&self, item_id: ItemId) -> AnalyticsResult<MenuRecommendation> {
        let item = self
            .ctx
            .store
            .get_item(item_id)?
            .ok_or(AnalyticsError::NotFound(item_id))?;
        let events = self.ctx.store.query_sales_events(item_id)?;
        let perf = SalesPerformanceAnalyzer::new(self.ctx).from_events(&events);
        Ok(self.recommend(&item, &perf, &events))
    }

    /// Recommendation from already-loaded inputs; no store access.
    ///
    /// Recency comes from the newest event, then the item's own last-sale stamp.
    pub fn recommend(&self, item: &Item, perf: &SalesPerformance, events: &[SalesEvent]) -> MenuRecommendation {
        let days = days_since_last_sale(events, self.ctx.now)
            .or_else(|| item.last_sale_at.map(|at| (self.ctx.now - at).num_days()))
            .unwrap_or(NEVER_SOLD_DAYS);
        classify(perf, days, self.ctx.config)
    }
}

/// First matching rule wins: dormant, stale, declining, high demand, keep.
pub fn classify(perf: &SalesPerformance, days_since_last_sale: i64, config: &AnalyticsConfig) -> MenuRecommendation {
    let (action, confidence, reasoning) = if days_since_last_sale > i64::from(config.dormant_sale_days) {
        (MenuAction::Remove, 0.9, "no sales in 3+ months")
    } else if days_since_last_sale > i64::from(config.stale_sale_days) {
        (MenuAction::Reduce, 0.7, "low sales activity")
    } else if perf.trend == SalesTrend::Decreasing {
        (MenuAction::Reduce, 0.6, "declining trend")
    } else if perf.sales_velocity > config.high_demand_velocity {
        (MenuAction::Increase, 0.8, "high demand")
    } else {
        (MenuAction::Keep, 0.5, "steady sales")
    };

    MenuRecommendation {
        action,
        confidence,
        reasoning: reasoning.to_string(),
        days_since_last_sale,
        sales_velocity: perf.sales_velocity,
    }
}
