use chrono::{DateTime, Utc};

use crate::config::AnalyticsConfig;

/// One read scope: the store, the policy, and the instant every window is measured from.
///
/// Cheap to copy; each analytics component takes it by value.
pub struct AnalysisContext<'a, S: ?Sized> {
    pub store: &'a S,
    pub config: &'a AnalyticsConfig,
    pub now: DateTime<Utc>,
}

impl<'a, S: ?Sized> AnalysisContext<'a, S> {
    pub fn new(store: &'a S, config: &'a AnalyticsConfig, now: DateTime<Utc>) -> Self {
        Self { store, config, now }
    }
}

impl<S: ?Sized> Clone for AnalysisContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for AnalysisContext<'_, S> {}
