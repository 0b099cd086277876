//! `cafestock-analytics`
//!
//! **Responsibility:** the inventory analytics engine.
//!
//! Turns stock counts and sales events into consumption rates, restock
//! forecasts, cost/waste estimates, sales trends and menu recommendations.
//!
//! - Deterministic heuristics over aggregates, not a trained model.
//! - Pull-based: every call opens its own read scope against an [`AnalyticsStore`].
//! - Storage-agnostic: stores are implemented by callers (see `cafestock-infra`).
//! - Never mutates items; only appends derived snapshot rows.

pub mod batch;
pub mod clock;
pub mod confidence;
pub mod config;
pub mod consumption;
pub mod context;
pub mod cost;
pub mod engine;
pub mod error;
pub mod menu;
pub mod recording;
pub mod report;
pub mod restock;
pub mod sales;
pub mod sanitize;
pub mod service;
pub mod snapshot;
pub mod store;

pub use batch::{BatchUpdateSummary, Collected, FailureStage, ItemFailure};
pub use clock::{Clock, FixedClock, SystemClock};
pub use confidence::ConfidenceScorer;
pub use config::AnalyticsConfig;
pub use consumption::{ConsumptionEstimate, ConsumptionEstimator};
pub use context::AnalysisContext;
pub use cost::{CostOptimization, CostOptimizer};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use menu::{MenuAction, MenuRecommendation, MenuRecommendationEngine};
pub use recording::{record_sale, record_stock_count};
pub use report::AnalyticsReport;
pub use restock::{RestockDate, RestockPrediction, RestockPredictor};
pub use sales::{SalesPerformance, SalesPerformanceAnalyzer, SalesTrend};
pub use sanitize::{sanitized, Sanitize, NEGATIVE_SENTINEL, POSITIVE_SENTINEL};
pub use service::{
    AnalyticsHistory, DashboardSummary, ItemCostOptimization, ItemMenuRecommendation,
    ItemRestockPrediction, ItemSalesPerformance,
};
pub use snapshot::{AnalyticsSnapshot, MenuRecommendationSnapshot};
pub use store::{AnalyticsStore, HistoryStore, StoreError};
