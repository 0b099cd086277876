//! Integration tests for the full analytics pipeline.
//!
//! Tests: history rows → AnalyticsStore → AnalyticsEngine → report / persisted snapshots
//!
//! Verifies:
//! - Component outputs agree with hand-computed values on a seeded history
//! - The batch update persists one pair of rows per active item
//! - A failing item never stops the others
//! - Concurrent calls over one store are independent

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use cafestock_analytics::{
        record_sale, record_stock_count, AnalyticsConfig, AnalyticsEngine, AnalyticsError,
        AnalyticsSnapshot, AnalyticsStore, FailureStage, FixedClock, MenuAction,
        MenuRecommendationSnapshot, RestockDate, SalesTrend, StoreError,
    };
    use cafestock_core::ItemId;
    use cafestock_inventory::{
        Item, NewItem, RecordSale, RecordStockCount, SalesEvent, StockSnapshot,
    };

    use crate::store::InMemoryAnalyticsStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn new_item(name: &str, quantity: f64, threshold: f64, cost: Option<f64>) -> Item {
        Item::create(NewItem {
            name: name.to_string(),
            unit: Some("unit".to_string()),
            category: Some("Cafe".to_string()),
            quantity,
            restock_threshold: threshold,
            cost_per_unit: cost,
        })
        .unwrap()
    }

    fn engine<S: AnalyticsStore>(store: Arc<S>) -> AnalyticsEngine<S> {
        AnalyticsEngine::new(store, AnalyticsConfig::default())
            .unwrap()
            .with_clock(FixedClock::new(now()))
    }

    /// Milk: counts 120 → 90 → 60 inside the window (2/day), two sales.
    fn seed_milk(store: &InMemoryAnalyticsStore) -> Item {
        let milk = new_item("Whole milk", 60.0, 20.0, Some(1.5));
        store.upsert_item(milk.clone()).unwrap();
        for (ago, qty) in [(25, 120.0), (15, 90.0), (5, 60.0)] {
            store.push_stock_snapshot(StockSnapshot::new(milk.id, qty, days_ago(ago))).unwrap();
        }
        store.push_sales_event(SalesEvent::new(milk.id, 30.0, days_ago(2))).unwrap();
        store.push_sales_event(SalesEvent::new(milk.id, 10.0, days_ago(40))).unwrap();
        milk
    }

    /// Croissant: below threshold, never sold, no cost.
    fn seed_croissant(store: &InMemoryAnalyticsStore) -> Item {
        let croissant = new_item("Croissant", 5.0, 10.0, None);
        store.upsert_item(croissant.clone()).unwrap();
        store.push_stock_snapshot(StockSnapshot::new(croissant.id, 30.0, days_ago(20))).unwrap();
        store.push_stock_snapshot(StockSnapshot::new(croissant.id, 5.0, days_ago(1))).unwrap();
        croissant
    }

    #[test]
    fn consumption_ignores_restocks() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let beans = new_item("Espresso beans", 90.0, 10.0, None);
        store.upsert_item(beans.clone()).unwrap();
        for (ago, qty) in [(20, 100.0), (10, 80.0), (5, 90.0)] {
            store.push_stock_snapshot(StockSnapshot::new(beans.id, qty, days_ago(ago))).unwrap();
        }
        // Outside the 30-day window.
        store.push_stock_snapshot(StockSnapshot::new(beans.id, 500.0, days_ago(45))).unwrap();

        let engine = engine(store);
        let daily = engine.estimate_daily_consumption(beans.id, 30).unwrap();
        assert!((daily - 20.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn oversized_lookback_reads_all_history_without_panicking() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let beans = new_item("Espresso beans", 90.0, 10.0, None);
        store.upsert_item(beans.clone()).unwrap();
        for (ago, qty) in [(400, 100.0), (10, 80.0), (5, 90.0)] {
            store
                .push_stock_snapshot(StockSnapshot::new(beans.id, qty, days_ago(ago)))
                .unwrap();
        }

        let daily = engine(store).estimate_daily_consumption(beans.id, u32::MAX).unwrap();
        assert_eq!(daily, 20.0 / f64::from(u32::MAX));
    }

    #[test]
    fn oversized_config_window_is_rejected_up_front() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let config = AnalyticsConfig::default().with_consumption_window_days(200_000_000);
        assert!(matches!(
            AnalyticsEngine::new(store, config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn full_report_matches_hand_computed_values() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let engine = engine(store);

        let report = engine.run_full_analytics(milk.id).unwrap();
        assert_eq!(report.item_id, milk.id);
        assert_eq!(report.generated_at, now());

        let p = &report.predictions;
        assert_eq!(p.daily_consumption, 2.0);
        assert_eq!(p.stock_life_days, 30.0);
        assert_eq!(p.optimal_restock_quantity, 42.0);
        match p.restock {
            RestockDate::Predicted {
                date,
                days_until,
                confidence,
            } => {
                assert_eq!(days_until, 20.0);
                assert_eq!(date, now() + Duration::days(20));
                // 3 counts + 2 sales.
                assert_eq!(confidence, 0.3);
            }
            RestockDate::NoPrediction => panic!("expected a prediction"),
        }

        let cost = report.cost_analysis.as_ref().expect("milk has a cost");
        assert_eq!(cost.daily_cost, 3.0);
        assert_eq!(cost.optimal_restock_cost, 63.0);
        assert_eq!(cost.waste_percentage, 0.0);
        assert_eq!(cost.optimal_restock_frequency_days, 21);

        let s = &report.sales_performance;
        assert_eq!(s.total_sales, 40.0);
        assert_eq!(s.sales_velocity, 1.0);
        assert_eq!(s.recent_sales, 30.0);
        assert_eq!(s.previous_sales, 10.0);
        assert_eq!(s.trend, SalesTrend::Increasing);

        let m = &report.menu_recommendations;
        assert_eq!(m.action, MenuAction::Keep);
        assert_eq!(m.days_since_last_sale, 2);
        assert_eq!(m.confidence, 0.5);
    }

    #[test]
    fn single_component_calls_agree_with_report() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let engine = engine(store);
        let report = engine.run_full_analytics(milk.id).unwrap();

        assert_eq!(engine.predict_restock_date(milk.id).unwrap(), report.predictions.restock);
        assert_eq!(engine.predict_stock_life(milk.id).unwrap(), 30.0);
        assert_eq!(engine.predict_optimal_restock_quantity(milk.id).unwrap(), 42.0);
        assert_eq!(engine.confidence_score(milk.id).unwrap(), 0.3);
        assert_eq!(
            engine.calculate_cost_optimization(milk.id).unwrap(),
            report.cost_analysis
        );
        assert_eq!(
            engine.analyze_sales_performance(milk.id).unwrap(),
            report.sales_performance
        );
        assert_eq!(
            engine.generate_menu_recommendations(milk.id).unwrap(),
            report.menu_recommendations
        );
    }

    #[test]
    fn report_serializes_with_stable_field_names() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let report = engine(store).run_full_analytics(milk.id).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["predictions"]["restock"]["status"], "predicted");
        assert_eq!(json["sales_performance"]["trend"], "increasing");
        assert_eq!(json["menu_recommendations"]["recommendation"], "keep");
    }

    #[test]
    fn unknown_item_behaviour_per_operation() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let engine = engine(store);
        let ghost = ItemId::new();

        assert!(matches!(
            engine.run_full_analytics(ghost),
            Err(AnalyticsError::NotFound(id)) if id == ghost
        ));
        assert!(matches!(
            engine.generate_menu_recommendations(ghost),
            Err(AnalyticsError::NotFound(_))
        ));
        assert_eq!(engine.predict_restock_date(ghost).unwrap(), RestockDate::NoPrediction);
        assert_eq!(engine.predict_stock_life(ghost).unwrap(), 0.0);
        assert_eq!(engine.predict_optimal_restock_quantity(ghost).unwrap(), 0.0);
        assert_eq!(engine.calculate_cost_optimization(ghost).unwrap(), None);
        assert_eq!(engine.estimate_daily_consumption(ghost, 30).unwrap(), 0.0);
    }

    #[test]
    fn item_without_history_gets_sentinels_and_remove() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let syrup = new_item("Vanilla syrup", 4.0, 1.0, None);
        store.upsert_item(syrup.clone()).unwrap();

        let report = engine(store).run_full_analytics(syrup.id).unwrap();
        assert_eq!(report.predictions.restock, RestockDate::NoPrediction);
        assert_eq!(report.predictions.stock_life_days, 999.0);
        assert_eq!(report.predictions.optimal_restock_quantity, 1.0);
        assert!(report.cost_analysis.is_none());
        assert_eq!(report.sales_performance.trend, SalesTrend::NoData);
        assert_eq!(report.menu_recommendations.days_since_last_sale, 999);
        assert_eq!(report.menu_recommendations.action, MenuAction::Remove);
    }

    #[test]
    fn menu_falls_back_to_item_last_sale() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let mut scone = new_item("Scone", 8.0, 2.0, None);
        scone.last_sale_at = Some(days_ago(40));
        store.upsert_item(scone.clone()).unwrap();

        let rec = engine(store).generate_menu_recommendations(scone.id).unwrap();
        assert_eq!(rec.days_since_last_sale, 40);
        assert_eq!(rec.action, MenuAction::Reduce);
        assert_eq!(rec.reasoning, "low sales activity");
    }

    #[test]
    fn batch_update_persists_one_pair_per_active_item() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let croissant = seed_croissant(&store);
        let mut retired = new_item("Pumpkin spice", 3.0, 1.0, Some(4.0));
        retired.deactivate();
        store.upsert_item(retired.clone()).unwrap();

        let engine = engine(store.clone());
        let summary = engine.update_analytics_for_all_items().unwrap();

        assert_eq!(summary.persisted_count, 2);
        assert_eq!(summary.failed_count, 0);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.timestamp, now());
        assert_eq!(store.analytics_count(), 2);
        assert_eq!(store.menu_count(), 2);
        assert!(store.analytics_history(retired.id).is_empty());
        assert!(store.menu_history(retired.id).is_empty());

        let milk_rows = store.analytics_history(milk.id);
        assert_eq!(milk_rows.len(), 1);
        assert_eq!(milk_rows[0].predicted_stock_life_days, 30.0);
        assert_eq!(milk_rows[0].model_version, "1.0");
        assert_eq!(milk_rows[0].computed_at, now());

        let croissant_menu = store.menu_history(croissant.id);
        assert_eq!(croissant_menu[0].recommendation, MenuAction::Remove);

        // Append-only: a second run adds rows rather than replacing them.
        engine.trigger_batch_update().unwrap();
        assert_eq!(store.analytics_history(milk.id).len(), 2);
        assert_eq!(store.analytics_count(), 4);
    }

    #[test]
    fn item_analytics_history_returns_latest_rows() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let engine = engine(store);

        assert!(matches!(
            engine.item_analytics_history(milk.id),
            Err(AnalyticsError::NoAnalyticsHistory(_))
        ));

        engine.update_analytics_for_all_items().unwrap();
        let history = engine.item_analytics_history(milk.id).unwrap();
        assert_eq!(history.item_id, milk.id);
        assert_eq!(history.analytics.avg_daily_consumption, 2.0);
        assert_eq!(history.analytics.confidence_score, 0.3);
        assert_eq!(history.analytics.sales_velocity, 1.0);
        let menu = history.menu_optimization.expect("menu row written with analytics");
        assert_eq!(menu.recommendation, MenuAction::Keep);
    }

    #[test]
    fn dashboard_counts_fleet() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        seed_milk(&store);
        seed_croissant(&store);

        let dash = engine(store).dashboard_summary().unwrap();
        assert_eq!(dash.total_items, 2);
        assert_eq!(dash.low_stock_items, 1);
        // Croissant is already below threshold; milk is 20 days out.
        assert_eq!(dash.items_needing_restock, 1);
        assert_eq!(dash.total_daily_cost, 3.0);
        assert_eq!(dash.high_performance_items, 0);
        assert_eq!(dash.items_to_remove, 1);
        assert_eq!(dash.failed_items, 0);
        assert_eq!(dash.generated_at, now());
    }

    #[test]
    fn listings_exclude_uncosted_items_from_cost_view() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let croissant = seed_croissant(&store);
        let engine = engine(store);

        let restock = engine.list_restock_predictions().unwrap();
        assert_eq!(restock.items.len(), 2);
        assert!(restock.is_complete());
        let row = restock.items.iter().find(|r| r.item_id == croissant.id).unwrap();
        assert_eq!(row.item_name, "Croissant");
        assert_eq!(row.current_stock, 5.0);
        assert!(row.prediction.restock.date().is_some_and(|d| d < now()));

        let costs = engine.list_cost_optimizations().unwrap();
        assert_eq!(costs.items.len(), 1);
        assert_eq!(costs.items[0].item_id, milk.id);

        let sales = engine.list_sales_performance().unwrap();
        assert_eq!(sales.items.len(), 2);

        let menu = engine.list_menu_recommendations().unwrap();
        assert_eq!(menu.items.len(), 2);
        assert!(menu.items.iter().all(|r| r.is_active));
    }

    #[test]
    fn recording_history_updates_item_state() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let oat = new_item("Oat milk", 12.0, 4.0, Some(2.0));
        store.upsert_item(oat.clone()).unwrap();

        let snap = record_stock_count(
            store.as_ref(),
            &RecordStockCount {
                item_id: oat.id,
                quantity: 7.0,
                notes: Some("closing count".to_string()),
                staff_name: Some("Sam".to_string()),
                counted_at: days_ago(1),
            },
        )
        .unwrap();
        assert_eq!(snap.quantity, 7.0);

        let sale = record_sale(
            store.as_ref(),
            &RecordSale {
                item_id: oat.id,
                quantity_sold: 2.0,
                revenue: Some(9.0),
                notes: None,
                sold_at: days_ago(1),
            },
        )
        .unwrap();
        assert_eq!(sale.revenue, Some(9.0));

        let stored = store.get_item(oat.id).unwrap().unwrap();
        assert_eq!(stored.quantity, 7.0);
        assert_eq!(stored.last_sale_at, Some(days_ago(1)));
        assert_eq!(store.count_history(oat.id).unwrap(), 2);

        let ghost = ItemId::new();
        let err = record_sale(
            store.as_ref(),
            &RecordSale {
                item_id: ghost,
                quantity_sold: 1.0,
                revenue: None,
                notes: None,
                sold_at: now(),
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());

        let err = record_stock_count(
            store.as_ref(),
            &RecordStockCount {
                item_id: oat.id,
                quantity: -1.0,
                notes: None,
                staff_name: None,
                counted_at: now(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::Domain(_)));
        assert_eq!(store.get_item(oat.id).unwrap().unwrap().quantity, 7.0);
    }

    /// Wraps the in-memory store and injects failures for chosen items.
    struct FlakyStore {
        inner: InMemoryAnalyticsStore,
        fail_persist: Option<ItemId>,
        fail_compute: Option<ItemId>,
    }

    impl AnalyticsStore for FlakyStore {
        fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
            self.inner.get_item(item_id)
        }

        fn list_active_items(&self) -> Result<Vec<Item>, StoreError> {
            self.inner.list_active_items()
        }

        fn query_stock_snapshots(
            &self,
            item_id: ItemId,
            since: DateTime<Utc>,
        ) -> Result<Vec<StockSnapshot>, StoreError> {
            self.inner.query_stock_snapshots(item_id, since)
        }

        fn query_sales_events(&self, item_id: ItemId) -> Result<Vec<SalesEvent>, StoreError> {
            if self.fail_compute == Some(item_id) {
                return Err(StoreError::Query("sales_history timed out".to_string()));
            }
            self.inner.query_sales_events(item_id)
        }

        fn append_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
            self.inner.append_analytics(snapshot)
        }

        fn append_menu_recommendation(
            &self,
            snapshot: &MenuRecommendationSnapshot,
        ) -> Result<(), StoreError> {
            self.inner.append_menu_recommendation(snapshot)
        }

        fn append_run(
            &self,
            analytics: &AnalyticsSnapshot,
            menu: &MenuRecommendationSnapshot,
        ) -> Result<(), StoreError> {
            if self.fail_persist == Some(analytics.item_id) {
                return Err(StoreError::Write("disk full".to_string()));
            }
            self.inner.append_run(analytics, menu)
        }

        fn latest_analytics(
            &self,
            item_id: ItemId,
        ) -> Result<Option<AnalyticsSnapshot>, StoreError> {
            self.inner.latest_analytics(item_id)
        }

        fn latest_menu_recommendation(
            &self,
            item_id: ItemId,
        ) -> Result<Option<MenuRecommendationSnapshot>, StoreError> {
            self.inner.latest_menu_recommendation(item_id)
        }
    }

    #[test]
    fn one_failing_item_does_not_stop_the_batch() {
        let inner = InMemoryAnalyticsStore::new();
        let items: Vec<Item> = (0..5)
            .map(|i| {
                let it = new_item(&format!("Item {i}"), 10.0, 2.0, Some(1.0));
                inner.upsert_item(it.clone()).unwrap();
                it
            })
            .collect();
        let store = Arc::new(FlakyStore {
            inner,
            fail_persist: Some(items[1].id),
            fail_compute: Some(items[3].id),
        });

        let summary = engine(store.clone()).update_analytics_for_all_items().unwrap();
        assert_eq!(summary.persisted_count, 3);
        assert_eq!(summary.failed_count, 2);

        let persist = summary
            .failures
            .iter()
            .find(|f| f.item_id == items[1].id)
            .unwrap();
        assert_eq!(persist.stage, FailureStage::Persist);
        let compute = summary
            .failures
            .iter()
            .find(|f| f.item_id == items[3].id)
            .unwrap();
        assert_eq!(compute.stage, FailureStage::Compute);

        assert_eq!(store.inner.analytics_count(), 3);
        assert!(store.inner.analytics_history(items[1].id).is_empty());
        assert!(store.inner.menu_history(items[1].id).is_empty());
        assert_eq!(store.inner.analytics_history(items[4].id).len(), 1);
    }

    #[test]
    fn listings_report_failed_items_alongside_rows() {
        let inner = InMemoryAnalyticsStore::new();
        let good = new_item("Tea", 10.0, 2.0, None);
        let bad = new_item("Cocoa", 10.0, 2.0, None);
        inner.upsert_item(good.clone()).unwrap();
        inner.upsert_item(bad.clone()).unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            fail_persist: None,
            fail_compute: Some(bad.id),
        });
        let engine = engine(store);

        let sales = engine.list_sales_performance().unwrap();
        assert_eq!(sales.items.len(), 1);
        assert_eq!(sales.items[0].item_id, good.id);
        assert_eq!(sales.failures.len(), 1);
        assert_eq!(sales.failures[0].item_id, bad.id);

        let dash = engine.dashboard_summary().unwrap();
        assert_eq!(dash.total_items, 2);
        assert_eq!(dash.failed_items, 1);

        assert!(matches!(
            engine.run_full_analytics(bad.id),
            Err(AnalyticsError::Store(StoreError::Query(_)))
        ));
    }

    #[test]
    fn concurrent_calls_are_independent() {
        let store = Arc::new(InMemoryAnalyticsStore::new());
        let milk = seed_milk(&store);
        let croissant = seed_croissant(&store);
        let engine = engine(store.clone());
        let expected_milk = engine.run_full_analytics(milk.id).unwrap();
        let expected_croissant = engine.run_full_analytics(croissant.id).unwrap();

        std::thread::scope(|s| {
            let mut handles = Vec::new();
            for i in 0..8 {
                let engine = engine.clone();
                let id = if i % 2 == 0 { milk.id } else { croissant.id };
                handles.push(s.spawn(move || engine.run_full_analytics(id).unwrap()));
            }
            handles.push(s.spawn(|| {
                engine.update_analytics_for_all_items().unwrap();
                engine.run_full_analytics(milk.id).unwrap()
            }));

            for h in handles {
                let report = h.join().unwrap();
                if report.item_id == milk.id {
                    assert_eq!(report, expected_milk);
                } else {
                    assert_eq!(report, expected_croissant);
                }
            }
        });

        assert_eq!(store.analytics_count(), 2);
    }
}
