//! Postgres-backed analytics store.
//!
//! Maps the engine's store seam onto the cafe schema:
//!
//! - `items` (+ optional `categories` join for the category name)
//! - `stock_history`, `sales_history` (append-only source history)
//! - `item_analytics`, `menu_optimization` (append-only derived rows)
//!
//! All ids are UUID columns; timestamps are `timestamptz`.
//!
//! ## Blocking
//!
//! The store trait is synchronous. Each call drives the query to completion on
//! the runtime handle given at construction, so calls must come from a thread
//! that is not itself executing inside that runtime (e.g. a plain thread or
//! `spawn_blocking`).

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::runtime::Handle;
use tracing::debug;
use uuid::Uuid;

use cafestock_analytics::{
    AnalyticsSnapshot, AnalyticsStore, HistoryStore, MenuAction, MenuRecommendationSnapshot,
    StoreError,
};
use cafestock_core::{ItemId, RecordId};
use cafestock_inventory::{Item, SalesEvent, StockSnapshot};

const ITEM_COLUMNS: &str = r#"
    i.id,
    i.name,
    i.unit,
    c.name AS category,
    i.quantity,
    i.restock_threshold,
    i.cost_per_unit,
    i.is_active,
    i.last_sale_date
"#;

pub struct PostgresAnalyticsStore {
    pool: Arc<PgPool>,
    runtime: Handle,
}

impl PostgresAnalyticsStore {
    pub fn new(pool: PgPool, runtime: Handle) -> Self {
        Self {
            pool: Arc::new(pool),
            runtime,
        }
    }

    /// Build against the runtime of the calling context.
    pub fn from_current(pool: PgPool) -> Result<Self, StoreError> {
        let runtime = Handle::try_current()
            .map_err(|e| StoreError::Unavailable(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(pool, runtime))
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn write_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Write(other.to_string()),
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<T, _>(column)
        .map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    Ok(Item {
        id: ItemId::from_uuid(get::<Uuid>(row, "id")?),
        name: get(row, "name")?,
        unit: get(row, "unit")?,
        category: get(row, "category")?,
        quantity: get(row, "quantity")?,
        restock_threshold: get(row, "restock_threshold")?,
        cost_per_unit: get(row, "cost_per_unit")?,
        is_active: get(row, "is_active")?,
        last_sale_at: get(row, "last_sale_date")?,
    })
}

fn stock_from_row(row: &PgRow) -> Result<StockSnapshot, StoreError> {
    Ok(StockSnapshot {
        id: RecordId::from_uuid(get::<Uuid>(row, "id")?),
        item_id: ItemId::from_uuid(get::<Uuid>(row, "item_id")?),
        quantity: get(row, "quantity")?,
        recorded_at: get(row, "recorded_at")?,
        notes: get(row, "notes")?,
        staff_name: get(row, "staff_name")?,
    })
}

fn sale_from_row(row: &PgRow) -> Result<SalesEvent, StoreError> {
    Ok(SalesEvent {
        id: RecordId::from_uuid(get::<Uuid>(row, "id")?),
        item_id: ItemId::from_uuid(get::<Uuid>(row, "item_id")?),
        quantity_sold: get(row, "quantity_sold")?,
        sold_at: get(row, "sale_date")?,
        revenue: get(row, "revenue")?,
        notes: get(row, "notes")?,
    })
}

fn analytics_from_row(row: &PgRow) -> Result<AnalyticsSnapshot, StoreError> {
    Ok(AnalyticsSnapshot {
        id: RecordId::from_uuid(get::<Uuid>(row, "id")?),
        item_id: ItemId::from_uuid(get::<Uuid>(row, "item_id")?),
        predicted_restock_date: get(row, "predicted_restock_date")?,
        predicted_stock_life_days: get(row, "predicted_stock_life_days")?,
        predicted_restock_quantity: get(row, "predicted_restock_quantity")?,
        confidence_score: get(row, "confidence_score")?,
        avg_daily_consumption: get(row, "avg_daily_consumption")?,
        sales_velocity: get(row, "sales_velocity")?,
        model_version: get(row, "model_version")?,
        computed_at: get(row, "computed_at")?,
    })
}

fn menu_from_row(row: &PgRow) -> Result<MenuRecommendationSnapshot, StoreError> {
    let recommendation: String = get(row, "recommendation")?;
    let recommendation: MenuAction = recommendation
        .parse()
        .map_err(|e| StoreError::Decode(format!("recommendation: {e}")))?;
    Ok(MenuRecommendationSnapshot {
        id: RecordId::from_uuid(get::<Uuid>(row, "id")?),
        item_id: ItemId::from_uuid(get::<Uuid>(row, "item_id")?),
        recommendation,
        confidence: get(row, "confidence")?,
        reasoning: get(row, "reasoning")?,
        days_since_last_sale: get(row, "days_since_last_sale")?,
        computed_at: get(row, "computed_at")?,
    })
}

async fn insert_analytics<'c, E>(executor: E, s: &AnalyticsSnapshot) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'c, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO item_analytics (
            id,
            item_id,
            predicted_restock_date,
            predicted_stock_life_days,
            predicted_restock_quantity,
            confidence_score,
            avg_daily_consumption,
            sales_velocity,
            model_version,
            computed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(*s.id.as_uuid())
    .bind(*s.item_id.as_uuid())
    .bind(s.predicted_restock_date)
    .bind(s.predicted_stock_life_days)
    .bind(s.predicted_restock_quantity)
    .bind(s.confidence_score)
    .bind(s.avg_daily_consumption)
    .bind(s.sales_velocity)
    .bind(&s.model_version)
    .bind(s.computed_at)
    .execute(executor)
    .await
    .map(|_| ())
}

async fn insert_menu<'c, E>(executor: E, s: &MenuRecommendationSnapshot) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'c, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO menu_optimization (
            id,
            item_id,
            recommendation,
            confidence,
            reasoning,
            days_since_last_sale,
            computed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(*s.id.as_uuid())
    .bind(*s.item_id.as_uuid())
    .bind(s.recommendation.as_str())
    .bind(s.confidence)
    .bind(&s.reasoning)
    .bind(s.days_since_last_sale)
    .bind(s.computed_at)
    .execute(executor)
    .await
    .map(|_| ())
}

impl AnalyticsStore for PostgresAnalyticsStore {
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let pool = self.pool.clone();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i LEFT JOIN categories c ON c.id = i.category_id WHERE i.id = $1"
        );
        let row = self
            .block_on(async {
                sqlx::query(&sql)
                    .bind(*item_id.as_uuid())
                    .fetch_optional(&*pool)
                    .await
            })
            .map_err(query_err)?;
        row.as_ref().map(item_from_row).transpose()
    }

    fn list_active_items(&self) -> Result<Vec<Item>, StoreError> {
        let pool = self.pool.clone();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i LEFT JOIN categories c ON c.id = i.category_id WHERE i.is_active ORDER BY i.id"
        );
        let rows = self
            .block_on(async { sqlx::query(&sql).fetch_all(&*pool).await })
            .map_err(query_err)?;
        debug!(count = rows.len(), "listed active items");
        rows.iter().map(item_from_row).collect()
    }

    fn query_stock_snapshots(
        &self,
        item_id: ItemId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StockSnapshot>, StoreError> {
        let pool = self.pool.clone();
        let rows = self
            .block_on(async {
                sqlx::query(
                    r#"
                    SELECT id, item_id, quantity, recorded_at, notes, staff_name
                    FROM stock_history
                    WHERE item_id = $1 AND recorded_at >= $2
                    ORDER BY recorded_at ASC
                    "#,
                )
                .bind(*item_id.as_uuid())
                .bind(since)
                .fetch_all(&*pool)
                .await
            })
            .map_err(query_err)?;
        rows.iter().map(stock_from_row).collect()
    }

    fn query_sales_events(&self, item_id: ItemId) -> Result<Vec<SalesEvent>, StoreError> {
        let pool = self.pool.clone();
        let rows = self
            .block_on(async {
                sqlx::query(
                    r#"
                    SELECT id, item_id, quantity_sold, sale_date, revenue, notes
                    FROM sales_history
                    WHERE item_id = $1
                    ORDER BY sale_date DESC
                    "#,
                )
                .bind(*item_id.as_uuid())
                .fetch_all(&*pool)
                .await
            })
            .map_err(query_err)?;
        rows.iter().map(sale_from_row).collect()
    }

    fn count_history(&self, item_id: ItemId) -> Result<usize, StoreError> {
        let pool = self.pool.clone();
        let total: i64 = self
            .block_on(async {
                sqlx::query_scalar(
                    r#"
                    SELECT
                        (SELECT COUNT(*) FROM stock_history WHERE item_id = $1)
                      + (SELECT COUNT(*) FROM sales_history WHERE item_id = $1)
                    "#,
                )
                .bind(*item_id.as_uuid())
                .fetch_one(&*pool)
                .await
            })
            .map_err(query_err)?;
        usize::try_from(total).map_err(|e| StoreError::Decode(format!("history count: {e}")))
    }

    fn append_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.block_on(insert_analytics(&*pool, snapshot))
            .map_err(write_err)
    }

    fn append_menu_recommendation(
        &self,
        snapshot: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.block_on(insert_menu(&*pool, snapshot))
            .map_err(write_err)
    }

    fn append_run(
        &self,
        analytics: &AnalyticsSnapshot,
        menu: &MenuRecommendationSnapshot,
    ) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.block_on(async {
            let mut tx = pool.begin().await?;
            insert_analytics(&mut *tx, analytics).await?;
            insert_menu(&mut *tx, menu).await?;
            tx.commit().await
        })
        .map_err(write_err)
    }

    fn latest_analytics(&self, item_id: ItemId) -> Result<Option<AnalyticsSnapshot>, StoreError> {
        let pool = self.pool.clone();
        let row = self
            .block_on(async {
                sqlx::query(
                    r#"
                    SELECT
                        id,
                        item_id,
                        predicted_restock_date,
                        predicted_stock_life_days,
                        predicted_restock_quantity,
                        confidence_score,
                        avg_daily_consumption,
                        sales_velocity,
                        model_version,
                        computed_at
                    FROM item_analytics
                    WHERE item_id = $1
                    ORDER BY computed_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(*item_id.as_uuid())
                .fetch_optional(&*pool)
                .await
            })
            .map_err(query_err)?;
        row.as_ref().map(analytics_from_row).transpose()
    }

    fn latest_menu_recommendation(
        &self,
        item_id: ItemId,
    ) -> Result<Option<MenuRecommendationSnapshot>, StoreError> {
        let pool = self.pool.clone();
        let row = self
            .block_on(async {
                sqlx::query(
                    r#"
                    SELECT
                        id,
                        item_id,
                        recommendation,
                        confidence,
                        reasoning,
                        days_since_last_sale,
                        computed_at
                    FROM menu_optimization
                    WHERE item_id = $1
                    ORDER BY computed_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(*item_id.as_uuid())
                .fetch_optional(&*pool)
                .await
            })
            .map_err(query_err)?;
        row.as_ref().map(menu_from_row).transpose()
    }
}

impl HistoryStore for PostgresAnalyticsStore {
    fn append_stock_count(&self, item: &Item, snapshot: &StockSnapshot) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.block_on(async {
            let mut tx = pool.begin().await?;
            sqlx::query(
                r#"
                INSERT INTO stock_history (id, item_id, quantity, recorded_at, notes, staff_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*snapshot.id.as_uuid())
            .bind(*snapshot.item_id.as_uuid())
            .bind(snapshot.quantity)
            .bind(snapshot.recorded_at)
            .bind(&snapshot.notes)
            .bind(&snapshot.staff_name)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE items SET quantity = $2 WHERE id = $1")
                .bind(*item.id.as_uuid())
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .map_err(write_err)
    }

    fn append_sale(&self, item: &Item, event: &SalesEvent) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.block_on(async {
            let mut tx = pool.begin().await?;
            sqlx::query(
                r#"
                INSERT INTO sales_history (id, item_id, quantity_sold, sale_date, revenue, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*event.id.as_uuid())
            .bind(*event.item_id.as_uuid())
            .bind(event.quantity_sold)
            .bind(event.sold_at)
            .bind(event.revenue)
            .bind(&event.notes)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE items SET last_sale_date = $2 WHERE id = $1")
                .bind(*item.id.as_uuid())
                .bind(item.last_sale_at)
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .map_err(write_err)
    }
}
