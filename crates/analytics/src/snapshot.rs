//! Derived rows appended once per engine run.
//!
//! Never updated in place; successive runs form a forecast history per item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafestock_core::{ItemId, RecordId};

use crate::menu::MenuAction;
use crate::report::AnalyticsReport;
use crate::sanitize::Sanitize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub id: RecordId,
    pub item_id: ItemId,
    pub predicted_restock_date: Option<DateTime<Utc>>,
    pub predicted_stock_life_days: f64,
    pub predicted_restock_quantity: f64,
    pub confidence_score: f64,
    pub avg_daily_consumption: f64,
    pub sales_velocity: f64,
    pub model_version: String,
    pub computed_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    pub fn from_report(report: &AnalyticsReport, model_version: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            item_id: report.item_id,
            predicted_restock_date: report.predictions.restock.date(),
            predicted_stock_life_days: report.predictions.stock_life_days,
            predicted_restock_quantity: report.predictions.optimal_restock_quantity,
            confidence_score: report.predictions.restock.confidence(),
            avg_daily_consumption: report.predictions.daily_consumption,
            sales_velocity: report.sales_performance.sales_velocity,
            model_version: model_version.into(),
            computed_at: report.generated_at,
        }
    }
}

impl Sanitize for AnalyticsSnapshot {
    fn sanitize(&mut self) {
        let AnalyticsSnapshot {
            id,
            item_id,
            predicted_restock_date,
            predicted_stock_life_days,
            predicted_restock_quantity,
            confidence_score,
            avg_daily_consumption,
            sales_velocity,
            model_version,
            computed_at,
        } = self;
        id.sanitize();
        item_id.sanitize();
        predicted_restock_date.sanitize();
        predicted_stock_life_days.sanitize();
        predicted_restock_quantity.sanitize();
        confidence_score.sanitize();
        avg_daily_consumption.sanitize();
        sales_velocity.sanitize();
        model_version.sanitize();
        computed_at.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuRecommendationSnapshot {
    pub id: RecordId,
    pub item_id: ItemId,
    pub recommendation: MenuAction,
    pub confidence: f64,
    pub reasoning: String,
    pub days_since_last_sale: i64,
    pub computed_at: DateTime<Utc>,
}

impl MenuRecommendationSnapshot {
    pub fn from_report(report: &AnalyticsReport) -> Self {
        let menu = &report.menu_recommendations;
        Self {
            id: RecordId::new(),
            item_id: report.item_id,
            recommendation: menu.action,
            confidence: menu.confidence,
            reasoning: menu.reasoning.clone(),
            days_since_last_sale: menu.days_since_last_sale,
            computed_at: report.generated_at,
        }
    }
}

impl Sanitize for MenuRecommendationSnapshot {
    fn sanitize(&mut self) {
        let MenuRecommendationSnapshot {
            id,
            item_id,
            recommendation: _,
            confidence,
            reasoning,
            days_since_last_sale,
            computed_at,
        } = self;
        id.sanitize();
        item_id.sanitize();
        confidence.sanitize();
        reasoning.sanitize();
        days_since_last_sale.sanitize();
        computed_at.sanitize();
    }
}
