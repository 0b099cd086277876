//! Runs analytics against the Postgres store and prints the result as JSON.
//!
//! Usage:
//!   cafestock-batch                  run the batch update over all active items
//!   cafestock-batch dashboard        print the dashboard summary
//!   cafestock-batch report <item>    print the full report for one item
//!   cafestock-batch history <item>   print the latest persisted snapshots for one item

use std::sync::Arc;

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use cafestock_analytics::AnalyticsEngine;
use cafestock_core::ItemId;
use cafestock_infra::{PostgresAnalyticsStore, Settings};

enum Command {
    Batch,
    Dashboard,
    Report(ItemId),
    History(ItemId),
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let item_arg = |name: &str| -> anyhow::Result<ItemId> {
        let raw = args
            .get(1)
            .with_context(|| format!("`{name}` needs an item id"))?;
        raw.parse::<ItemId>()
            .with_context(|| format!("invalid item id {raw:?}"))
    };

    match args.first().map(String::as_str) {
        None | Some("batch") => Ok(Command::Batch),
        Some("dashboard") => Ok(Command::Dashboard),
        Some("report") => Ok(Command::Report(item_arg("report")?)),
        Some("history") => Ok(Command::History(item_arg("history")?)),
        Some(other) => bail!("unknown command {other:?}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cafestock_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    let settings = Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to postgres")?;

    let store = Arc::new(PostgresAnalyticsStore::from_current(pool)?);
    let engine = AnalyticsEngine::new(store, settings.analytics)?;

    // The store blocks on the runtime; keep it off the async workers.
    let output = tokio::task::spawn_blocking(move || -> anyhow::Result<serde_json::Value> {
        let value = match command {
            Command::Batch => {
                let summary = engine.trigger_batch_update()?;
                tracing::info!(
                    persisted = summary.persisted_count,
                    failed = summary.failed_count,
                    "batch update complete"
                );
                serde_json::to_value(summary)?
            }
            Command::Dashboard => serde_json::to_value(engine.dashboard_summary()?)?,
            Command::Report(id) => serde_json::to_value(engine.get_predictions(id)?)?,
            Command::History(id) => serde_json::to_value(engine.item_analytics_history(id)?)?,
        };
        Ok(value)
    })
    .await
    .context("analytics task did not complete")??;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
