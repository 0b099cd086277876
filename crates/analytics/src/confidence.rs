use tracing::debug;

use cafestock_core::ItemId;

use crate::context::AnalysisContext;
use crate::error::AnalyticsResult;
use crate::store::AnalyticsStore;

/// Lower clamp for any confidence the engine reports on a forecast.
pub const MIN_CONFIDENCE: f64 = 0.1;
/// Upper clamp for any confidence the engine reports on a forecast.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Maps history volume to a coarse confidence bucket.
pub struct ConfidenceScorer<'a, S: ?Sized> {
    ctx: AnalysisContext<'a, S>,
}

impl<'a, S> ConfidenceScorer<'a, S>
where
    S: AnalyticsStore + ?Sized,
{
    pub fn new(ctx: AnalysisContext<'a, S>) -> Self {
        Self { ctx }
    }

    /// Bucketed score from the item's total stock + sales rows.
    pub fn score(&self, item_id: ItemId) -> AnalyticsResult<f64> {
        let records = self.ctx.store.count_history(item_id)?;
        let score = confidence_bucket(records);
        debug!(item = %item_id, records, score, "scored forecast confidence");
        Ok(score)
    }
}

/// `<5 -> 0.1`, `<10 -> 0.3`, `<20 -> 0.6`, otherwise `0.9`.
pub fn confidence_bucket(total_records: usize) -> f64 {
    match total_records {
        0..5 => 0.1,
        5..10 => 0.3,
        10..20 => 0.6,
        _ => 0.9,
    }
}

/// Clamp into `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_CONFIDENCE;
    }
    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
