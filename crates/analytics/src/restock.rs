use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use cafestock_core::ItemId;
use cafestock_inventory::Item;

use crate::clock::{days_after, days_before};
use crate::confidence::{clamp_confidence, ConfidenceScorer};
use crate::consumption::ConsumptionEstimator;
use crate::context::AnalysisContext;
use crate::error::AnalyticsResult;
use crate::sanitize::{Sanitize, POSITIVE_SENTINEL};
use crate::store::AnalyticsStore;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// When the item is expected to hit its restock threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RestockDate {
    /// `days_until` is negative when the item is already below threshold.
    Predicted {
        date: DateTime<Utc>,
        days_until: f64,
        confidence: f64,
    },
    /// No usable consumption rate, or the item does not exist.
    NoPrediction,
}

impl RestockDate {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self {
            RestockDate::Predicted { date, .. } => Some(*date),
            RestockDate::NoPrediction => None,
        }
    }

    /// Zero when there is no prediction.
    pub fn confidence(&self) -> f64 {
        match self {
            RestockDate::Predicted { confidence, .. } => *confidence,
            RestockDate::NoPrediction => 0.0,
        }
    }

    /// Predicted to reach the threshold on or before `deadline`.
    pub fn is_due_by(&self, deadline: DateTime<Utc>) -> bool {
        self.date().is_some_and(|d| d <= deadline)
    }
}

impl Sanitize for RestockDate {
    fn sanitize(&mut self) {
        match self {
            RestockDate::Predicted {
                date,
                days_until,
                confidence,
            } => {
                date.sanitize();
                days_until.sanitize();
                confidence.sanitize();
            }
            RestockDate::NoPrediction => {}
        }
    }
}

/// Restock forecast for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockPrediction {
    pub restock: RestockDate,
    pub stock_life_days: f64,
    pub optimal_restock_quantity: f64,
    pub daily_consumption: f64,
}

impl Sanitize for RestockPrediction {
    fn sanitize(&mut self) {
        let RestockPrediction {
            restock,
            stock_life_days,
            optimal_restock_quantity,
            daily_consumption,
        } = self;
        restock.sanitize();
        stock_life_days.sanitize();
        optimal_restock_quantity.sanitize();
        daily_consumption.sanitize();
    }
}

pub struct RestockPredictor<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> RestockPredictor<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    pub fn predict_restock_date(&self, item_id: ItemId) -> AnalyticsResult<RestockDate> {
        let Some(item) = self.ctx.store.get_item(item_id)? else {
            return Ok(RestockDate::NoPrediction);
        };
        let daily = self.daily_consumption(item_id)?;
        if daily <= 0.0 {
            return Ok(RestockDate::NoPrediction);
        }
        let score = ConfidenceScorer::new(self.ctx).score(item_id)?;
        Ok(restock_date(&item, daily, score, self.ctx.now))
    }

    /// Days the current quantity lasts; `999.0` without consumption, `0.0` for an unknown item.
    pub fn predict_stock_life(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        let Some(item) = self.ctx.store.get_item(item_id)? else {
            return Ok(0.0);
        };
        Ok(stock_life_days(item.quantity, self.daily_consumption(item_id)?))
    }

    /// Quantity covering the configured number of days, never below the threshold.
    /// `0.0` for an unknown item.
    pub fn predict_optimal_restock_quantity(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        let Some(item) = self.ctx.store.get_item(item_id)? else {
            return Ok(0.0);
        };
        Ok(optimal_restock_quantity(
            item.restock_threshold,
            self.daily_consumption(item_id)?,
            self.ctx.config.restock_coverage_days,
        ))
    }

    /// Full forecast from an already-loaded item and rate; no store access.
    pub fn forecast(&self, item: &Item, daily_consumption: f64, confidence_score: f64) -> RestockPrediction {
        let restock = if daily_consumption > 0.0 {
            restock_date(item, daily_consumption, confidence_score, self.ctx.now)
        } else {
            RestockDate::NoPrediction
        };

        RestockPrediction {
            restock,
            stock_life_days: stock_life_days(item.quantity, daily_consumption),
            optimal_restock_quantity: optimal_restock_quantity(
                item.restock_threshold,
                daily_consumption,
                self.ctx.config.restock_coverage_days,
            ),
            daily_consumption,
        }
    }

    fn daily_consumption(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        let estimate = ConsumptionEstimator::new(self.ctx)
            .estimate(item_id, self.ctx.config.consumption_window_days)?;
        Ok(estimate.daily_consumption)
    }
}

/// `(quantity - threshold) / daily` days from `now`; overdue items get a past date.
///
/// Callers must pass a positive rate.
pub fn restock_date(
    item: &Item,
    daily_consumption: f64,
    confidence_score: f64,
    now: DateTime<Utc>,
) -> RestockDate {
    let days_until = (item.quantity - item.restock_threshold) / daily_consumption;
    let (date, days_until) = offset_by_days(now, days_until);
    RestockDate::Predicted {
        date,
        days_until,
        confidence: clamp_confidence(confidence_score),
    }
}

pub fn stock_life_days(quantity: f64, daily_consumption: f64) -> f64 {
    if daily_consumption <= 0.0 {
        return POSITIVE_SENTINEL;
    }
    quantity / daily_consumption
}

pub fn optimal_restock_quantity(restock_threshold: f64, daily_consumption: f64, coverage_days: u32) -> f64 {
    if daily_consumption <= 0.0 {
        return restock_threshold;
    }
    (daily_consumption * f64::from(coverage_days)).max(restock_threshold)
}

/// Shift `now` by a fractional day count.
///
/// Offsets that are non-finite or outside chrono's range fall back to the
/// 999-day sentinel (sign preserved) so the date is always representable.
fn offset_by_days(now: DateTime<Utc>, days: f64) -> (DateTime<Utc>, f64) {
    let shifted = if days.is_finite() {
        Duration::try_milliseconds((days * MILLIS_PER_DAY).round() as i64)
            .and_then(|delta| now.checked_add_signed(delta))
    } else {
        None
    };

    match shifted {
        Some(date) => (date, days),
        None => {
            let sentinel_days = POSITIVE_SENTINEL as u32;
            if days.is_sign_negative() {
                (days_before(now, sentinel_days), -POSITIVE_SENTINEL)
            } else {
                (days_after(now, sentinel_days), POSITIVE_SENTINEL)
            }
        }
    }
}
