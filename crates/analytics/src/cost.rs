use serde::{Deserialize, Serialize};

use cafestock_core::ItemId;
use cafestock_inventory::Item;

use crate::config::AnalyticsConfig;
use crate::confidence::ConfidenceScorer;
use crate::consumption::ConsumptionEstimator;
use crate::context::AnalysisContext;
use crate::error::AnalyticsResult;
use crate::restock::{RestockPrediction, RestockPredictor};
use crate::sanitize::Sanitize;
use crate::store::AnalyticsStore;

/// Daily spend and overstock waste projection for a costed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOptimization {
    pub cost_per_unit: f64,
    pub daily_cost: f64,
    pub optimal_restock_quantity: f64,
    pub optimal_restock_cost: f64,
    /// Fraction in `[0, max_waste_fraction]`.
    pub waste_percentage: f64,
    pub optimal_restock_frequency_days: u32,
}

impl Sanitize for CostOptimization {
    fn sanitize(&mut self) {
        let CostOptimization {
            cost_per_unit,
            daily_cost,
            optimal_restock_quantity,
            optimal_restock_cost,
            waste_percentage,
            optimal_restock_frequency_days,
        } = self;
        cost_per_unit.sanitize();
        daily_cost.sanitize();
        optimal_restock_quantity.sanitize();
        optimal_restock_cost.sanitize();
        waste_percentage.sanitize();
        optimal_restock_frequency_days.sanitize();
    }
}

pub struct CostOptimizer<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> CostOptimizer<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    /// `None` when the item is unknown or has no cost-per-unit (not applicable, not an error).
    pub fn calculate_cost_optimization(&self, item_id: ItemId) -> AnalyticsResult<Option<CostOptimization>> {
        let Some(item) = self.ctx.store.get_item(item_id)? else {
            return Ok(None);
        };
        if item.cost_per_unit.is_none() {
            return Ok(None);
        }

        let daily = ConsumptionEstimator::new(self.ctx)
            .estimate(item_id, self.ctx.config.consumption_window_days)?
            .daily_consumption;
        let score = ConfidenceScorer::new(self.ctx).score(item_id)?;
        let prediction = RestockPredictor::new(self.ctx).forecast(&item, daily, score);
        Ok(self.optimize(&item, &prediction))
    }

    /// Cost projection from an existing forecast; no store access.
    pub fn optimize(&self, item: &Item, prediction: &RestockPrediction) -> Option<CostOptimization> {
        let cost_per_unit = item.cost_per_unit?;
        Some(cost_optimization(cost_per_unit, prediction, self.ctx.config))
    }
}

pub fn cost_optimization(
    cost_per_unit: f64,
    prediction: &RestockPrediction,
    config: &AnalyticsConfig,
) -> CostOptimization {
    CostOptimization {
        cost_per_unit,
        daily_cost: prediction.daily_consumption * cost_per_unit,
        optimal_restock_quantity: prediction.optimal_restock_quantity,
        optimal_restock_cost: prediction.optimal_restock_quantity * cost_per_unit,
        waste_percentage: waste_fraction(
            prediction.stock_life_days,
            config.overstock_horizon_days,
            config.max_waste_fraction,
        ),
        optimal_restock_frequency_days: config.restock_coverage_days,
    }
}

/// Share of stock expected to spoil: zero up to `horizon_days` of stock life,
/// then `(life - horizon) / life`, capped at `cap`.
pub fn waste_fraction(stock_life_days: f64, horizon_days: f64, cap: f64) -> f64 {
    if stock_life_days <= horizon_days {
        return 0.0;
    }
    cap.min((stock_life_days - horizon_days) / stock_life_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restock::RestockDate;
    use proptest::prelude::*;

    fn prediction(daily: f64, life: f64, qty: f64) -> RestockPrediction {
        RestockPrediction {
            restock: RestockDate::NoPrediction,
            stock_life_days: life,
            optimal_restock_quantity: qty,
            daily_consumption: daily,
        }
    }

    #[test]
    fn computes_costs_from_forecast() {
        let cfg = AnalyticsConfig::default();
        let out = cost_optimization(2.0, &prediction(3.0, 10.0, 63.0), &cfg);
        assert_eq!(out.daily_cost, 6.0);
        assert_eq!(out.optimal_restock_cost, 126.0);
        assert_eq!(out.waste_percentage, 0.0);
        assert_eq!(out.optimal_restock_frequency_days, 21);
    }

    #[test]
    fn waste_is_zero_up_to_horizon() {
        assert_eq!(waste_fraction(0.0, 30.0, 0.3), 0.0);
        assert_eq!(waste_fraction(30.0, 30.0, 0.3), 0.0);
    }

    #[test]
    fn waste_grows_then_caps() {
        let w40 = waste_fraction(40.0, 30.0, 0.3);
        assert!((w40 - 0.25).abs() < 1e-12);
        assert_eq!(waste_fraction(999.0, 30.0, 0.3), 0.3);
    }

    proptest! {
        /// Property: waste never decreases as stock life grows and never exceeds the cap.
        #[test]
        fn waste_is_monotonic_and_capped(a in 0.0f64..10_000.0, b in 0.0f64..10_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let w_lo = waste_fraction(lo, 30.0, 0.3);
            let w_hi = waste_fraction(hi, 30.0, 0.3);
            prop_assert!(w_lo <= w_hi);
            prop_assert!((0.0..=0.3).contains(&w_hi));
        }

        /// Property: below the cap the waste estimate is strictly increasing.
        #[test]
        fn waste_strictly_increases_below_cap(life in 30.5f64..42.0, step in 0.5f64..5.0) {
            // (life - 30) / life < 0.3 holds for life < 42.857...
            let next = life + step;
            prop_assume!(next < 42.8);
            prop_assert!(waste_fraction(life, 30.0, 0.3) < waste_fraction(next, 30.0, 0.3));
        }
    }
}
