//! SQLite rendering of the billing store.
//!
//! The original deployment kept fees and invoices as per-partner document sub-collections. Relationally that is a
//! pair of tables keyed by `partner_id`; the "collection group" lookup on `payment_id` is a partial unique index on
//! the invoices table. Multi-document batches become ordinary transactions.
pub(crate) mod db;
mod sqlite_impl;

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub use sqlite_impl::SqliteDatabase;

use crate::traits::BillingError;

const SQLITE_DB_URL: &str = "sqlite://data/pbg_store.db";

pub fn db_url() -> String {
    let result = env::var("PBG_DATABASE_URL").unwrap_or_else(|_| {
        info!("PBG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, BillingError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), BillingError> {
    sqlx::migrate!("./src/sqlite/migrations")
        .run(pool)
        .await
        .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
    info!("🗃️ Migrations complete");
    Ok(())
}
