//! # Demo Data Seeder
//!
//! Loads a small grocery catalog and stock for both channels.
//!
//! ## Usage
//! ```bash
//! cargo run -p outlet-db --bin seed
//! cargo run -p outlet-db --bin seed -- --db ./data/outlet.db
//! RUST_LOG=debug cargo run -p outlet-db --bin seed
//! ```
//!
//! Each item gets two counter batches (an older one that expires sooner and
//! a fresh one) and one online batch, so FIFO and expiry ordering are both
//! visible from the first sale.

use chrono::{Duration, Utc};
use outlet_core::{Channel, Item, Money, StockBatch};
use outlet_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (code, name, price in cents, counter qty, online qty)
const CATALOG: &[(&str, &str, i64, i64, i64)] = &[
    ("ITEM001", "Rice 1kg", 1599, 120, 60),
    ("ITEM002", "Tea 500g", 2000, 80, 40),
    ("ITEM003", "Sugar 1kg", 899, 150, 50),
    ("ITEM004", "Milk Powder 400g", 2450, 40, 20),
    ("ITEM005", "Coconut Oil 750ml", 1875, 30, 45),
    ("ITEM006", "Red Lentils 500g", 650, 200, 90),
    ("ITEM007", "Biscuits 200g", 325, 25, 10),
    ("ITEM008", "Curry Powder 100g", 480, 60, 30),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config = DbConfig::new(path);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Outlet demo data seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $OUTLET_DB_PATH or ./outlet.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(config).await?;

    let existing = db.items().count().await?;
    if existing > 0 {
        warn!(existing, "Catalog already populated, skipping seed");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let items = db.items();
    let stock = db.stock();

    for &(code, name, price, counter_qty, online_qty) in CATALOG {
        let item = Item::new(code, name, Money::from_cents(price));
        items.upsert(&item).await?;

        let older = counter_qty / 3;
        let batches = [
            (
                Channel::Counter,
                StockBatch::new(&item, older, today - Duration::days(40), today + Duration::days(20)),
            ),
            (
                Channel::Counter,
                StockBatch::new(
                    &item,
                    counter_qty - older,
                    today - Duration::days(5),
                    today + Duration::days(180),
                ),
            ),
            (
                Channel::Online,
                StockBatch::new(&item, online_qty, today - Duration::days(10), today + Duration::days(120)),
            ),
        ];

        for (channel, batch) in &batches {
            if batch.original_quantity > 0 {
                stock.insert(*channel, batch).await?;
            }
        }
    }

    info!(
        items = items.count().await?,
        counter_batches = stock.load(Channel::Counter).await?.len(),
        online_batches = stock.load(Channel::Online).await?.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
