//! Database operations for the inventory `PostgreSQL` store.
//!
//! # Tables
//!
//! - `product` / `warehouse` / `combo_product` - Catalog reference data
//! - `combo_component` - Bill of materials for combos
//! - `packaging_requirement` / `combo_packaging_requirement` - Packaging
//!   consumed when items reach finished form
//! - `stock_record` / `combo_stock_record` - The stock ledger counters
//! - `inventory_transaction` - Append-only audit trail
//! - `batch_shipment` - Batch shipment summary records
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p packhouse-cli -- migrate
//! ```
//!
//! All queries use the runtime `sqlx` API (`query_as::<_, Row>` with explicit
//! binds); row structs derive `sqlx::FromRow` and convert into domain models.

pub mod catalog;
pub mod stock;
pub mod transactions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
