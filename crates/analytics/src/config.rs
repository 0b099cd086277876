//! Tunable thresholds for the analytics heuristics.

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Longest lookback or horizon any day-count setting may use (ten years).
pub const MAX_WINDOW_DAYS: u32 = 3_650;

/// Policy knobs for every analytics component.
///
/// `Default` reproduces the stock behaviour: 30-day consumption window,
/// three-week restock coverage, 30/90-day sales staleness cut-offs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Lookback (and divisor) for the consumption rate.
    pub consumption_window_days: u32,
    /// Days of demand a restock should cover.
    pub restock_coverage_days: u32,
    /// Stock life beyond which part of the stock is assumed to go to waste.
    pub overstock_horizon_days: f64,
    /// Cap on the projected waste fraction.
    pub max_waste_fraction: f64,
    /// Length of each of the two windows compared for the sales trend.
    pub trend_window_days: u32,
    /// No sale for longer than this => reduce.
    pub stale_sale_days: u32,
    /// No sale for longer than this => remove.
    pub dormant_sale_days: u32,
    /// Velocity (units/day) above which an item is recommended for increase.
    pub high_demand_velocity: f64,
    /// Velocity (units/day) above which the dashboard counts an item as high-performing.
    pub high_performance_velocity: f64,
    /// Restock dates within this many days count as "needing restock".
    pub restock_alert_days: u32,
    /// Tag written into every persisted analytics snapshot.
    pub model_version: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            consumption_window_days: 30,
            restock_coverage_days: 21,
            overstock_horizon_days: 30.0,
            max_waste_fraction: 0.3,
            trend_window_days: 30,
            stale_sale_days: 30,
            dormant_sale_days: 90,
            high_demand_velocity: 10.0,
            high_performance_velocity: 5.0,
            restock_alert_days: 7,
            model_version: "1.0".to_string(),
        }
    }
}

impl AnalyticsConfig {
    pub fn with_consumption_window_days(mut self, days: u32) -> Self {
        self.consumption_window_days = days;
        self
    }

    pub fn with_restock_coverage_days(mut self, days: u32) -> Self {
        self.restock_coverage_days = days;
        self
    }

    pub fn with_trend_window_days(mut self, days: u32) -> Self {
        self.trend_window_days = days;
        self
    }

    pub fn with_sale_staleness(mut self, stale_days: u32, dormant_days: u32) -> Self {
        self.stale_sale_days = stale_days;
        self.dormant_sale_days = dormant_days;
        self
    }

    pub fn with_high_demand_velocity(mut self, velocity: f64) -> Self {
        self.high_demand_velocity = velocity;
        self
    }

    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    /// Reject configurations the heuristics cannot run with.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.consumption_window_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "consumption_window_days must be > 0".to_string(),
            ));
        }
        if self.restock_coverage_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "restock_coverage_days must be > 0".to_string(),
            ));
        }
        if self.trend_window_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "trend_window_days must be > 0".to_string(),
            ));
        }
        for (name, days) in [
            ("consumption_window_days", self.consumption_window_days),
            ("restock_coverage_days", self.restock_coverage_days),
            ("trend_window_days", self.trend_window_days),
            ("stale_sale_days", self.stale_sale_days),
            ("dormant_sale_days", self.dormant_sale_days),
            ("restock_alert_days", self.restock_alert_days),
        ] {
            if days > MAX_WINDOW_DAYS {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{name} must be at most {MAX_WINDOW_DAYS}"
                )));
            }
        }
        if self.stale_sale_days > self.dormant_sale_days {
            return Err(AnalyticsError::InvalidConfig(
                "stale_sale_days must not exceed dormant_sale_days".to_string(),
            ));
        }
        if !(self.overstock_horizon_days > 0.0
            && self.overstock_horizon_days <= f64::from(MAX_WINDOW_DAYS))
        {
            return Err(AnalyticsError::InvalidConfig(format!(
                "overstock_horizon_days must be within (0, {MAX_WINDOW_DAYS}]"
            )));
        }
        if !(0.0..=1.0).contains(&self.max_waste_fraction) {
            return Err(AnalyticsError::InvalidConfig(
                "max_waste_fraction must be within [0, 1]".to_string(),
            ));
        }
        for (name, v) in [
            ("high_demand_velocity", self.high_demand_velocity),
            ("high_performance_velocity", self.high_performance_velocity),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number"
                )));
            }
        }
        if self.model_version.trim().is_empty() {
            return Err(AnalyticsError::InvalidConfig(
                "model_version cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = AnalyticsConfig::default()
            .with_consumption_window_days(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfig(msg) if msg.contains("consumption_window_days")));
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let too_long = MAX_WINDOW_DAYS + 1;
        let cases = [
            ("consumption_window_days", AnalyticsConfig::default().with_consumption_window_days(200_000_000)),
            ("restock_coverage_days", AnalyticsConfig::default().with_restock_coverage_days(too_long)),
            ("trend_window_days", AnalyticsConfig::default().with_trend_window_days(too_long)),
            ("dormant_sale_days", AnalyticsConfig::default().with_sale_staleness(30, too_long)),
            ("stale_sale_days", AnalyticsConfig::default().with_sale_staleness(u32::MAX, u32::MAX)),
            (
                "restock_alert_days",
                AnalyticsConfig {
                    restock_alert_days: too_long,
                    ..AnalyticsConfig::default()
                },
            ),
            (
                "overstock_horizon_days",
                AnalyticsConfig {
                    overstock_horizon_days: f64::INFINITY,
                    ..AnalyticsConfig::default()
                },
            ),
        ];
        for (field, cfg) in cases {
            let err = cfg.validate().unwrap_err();
            assert!(
                matches!(&err, AnalyticsError::InvalidConfig(msg) if msg.contains(field)),
                "{field}: {err}"
            );
        }
    }

    #[test]
    fn longest_allowed_windows_are_accepted() {
        AnalyticsConfig::default()
            .with_consumption_window_days(MAX_WINDOW_DAYS)
            .with_trend_window_days(MAX_WINDOW_DAYS)
            .with_sale_staleness(MAX_WINDOW_DAYS, MAX_WINDOW_DAYS)
            .validate()
            .unwrap();
    }

    #[test]
    fn inverted_staleness_is_rejected() {
        let err = AnalyticsConfig::default()
            .with_sale_staleness(120, 60)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfig(_)));
    }

    #[test]
    fn waste_cap_out_of_range_is_rejected() {
        let cfg = AnalyticsConfig {
            max_waste_fraction: 1.5,
            ..AnalyticsConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
