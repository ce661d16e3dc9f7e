//! Stock ledger operations: row locking, counter adjustment, stock queries.
//!
//! Counter mutations only happen inside an engine-owned transaction that has
//! already locked every touched row with `SELECT ... FOR UPDATE` in ascending
//! product-id order. The functions here are the ledger primitives; precondition
//! checks live in the engine's planning layer.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};

use packhouse_core::{ComboProductId, ProductId, StockBucket, WarehouseId};

use super::RepositoryError;
use crate::models::stock::{ComboStockRecord, StockRecord, WarehouseSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for stock record queries.
#[derive(Debug, sqlx::FromRow)]
struct StockRecordRow {
    product_id: i32,
    warehouse_id: i32,
    in_transit: i32,
    semi_finished: i32,
    finished: i32,
    shipped: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StockRecordRow> for StockRecord {
    fn from(row: StockRecordRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            in_transit: row.in_transit,
            semi_finished: row.semi_finished,
            finished: row.finished,
            shipped: row.shipped,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for combo stock record queries.
#[derive(Debug, sqlx::FromRow)]
struct ComboStockRecordRow {
    combo_product_id: i32,
    warehouse_id: i32,
    finished: i32,
    shipped: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ComboStockRecordRow> for ComboStockRecord {
    fn from(row: ComboStockRecordRow) -> Self {
        Self {
            combo_product_id: ComboProductId::new(row.combo_product_id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            finished: row.finished,
            shipped: row.shipped,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for the base half of the warehouse summary.
#[derive(Debug, sqlx::FromRow)]
struct BaseSummaryRow {
    warehouse_id: i32,
    warehouse_name: String,
    total_products: i64,
    total_in_transit: i64,
    total_semi_finished: i64,
    total_finished: i64,
    total_shipped: i64,
}

/// Internal row type for the combo half of the warehouse summary.
#[derive(Debug, sqlx::FromRow)]
struct ComboSummaryRow {
    warehouse_id: i32,
    total_combo_products: i64,
    total_combo_finished: i64,
    total_combo_shipped: i64,
}

/// The `stock_record` counter column backing a bucket.
const fn bucket_column(bucket: StockBucket) -> &'static str {
    match bucket {
        StockBucket::InTransit => "in_transit",
        StockBucket::SemiFinished => "semi_finished",
        StockBucket::Finished => "finished",
        StockBucket::Shipped => "shipped",
    }
}

// =============================================================================
// Row Locking
// =============================================================================

/// Lock the stock records for a set of products in one warehouse.
///
/// Rows are locked in ascending product-id order so that overlapping
/// transitions always acquire locks in the same sequence. Pairs without a
/// persisted record are simply absent from the result; callers treat them as
/// zeroed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails (including lock
/// timeout, which the engine maps to a contention error).
pub async fn lock_stock_records(
    conn: &mut PgConnection,
    warehouse_id: WarehouseId,
    product_ids: &[ProductId],
) -> Result<Vec<StockRecord>, RepositoryError> {
    let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();

    let rows = sqlx::query_as::<_, StockRecordRow>(
        r"
        SELECT product_id, warehouse_id, in_transit, semi_finished, finished, shipped,
               created_at, updated_at
        FROM stock_record
        WHERE warehouse_id = $1 AND product_id = ANY($2)
        ORDER BY product_id
        FOR UPDATE
        ",
    )
    .bind(warehouse_id)
    .bind(ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Create the stock record for a pair if absent, then lock and return it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn ensure_stock_record(
    conn: &mut PgConnection,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<StockRecord, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO stock_record (product_id, warehouse_id)
        VALUES ($1, $2)
        ON CONFLICT (product_id, warehouse_id) DO NOTHING
        ",
    )
    .bind(product_id)
    .bind(warehouse_id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, StockRecordRow>(
        r"
        SELECT product_id, warehouse_id, in_transit, semi_finished, finished, shipped,
               created_at, updated_at
        FROM stock_record
        WHERE product_id = $1 AND warehouse_id = $2
        FOR UPDATE
        ",
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

/// Lock the combo stock record for a pair, if it exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_combo_stock_record(
    conn: &mut PgConnection,
    combo_product_id: ComboProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<ComboStockRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, ComboStockRecordRow>(
        r"
        SELECT combo_product_id, warehouse_id, finished, shipped, created_at, updated_at
        FROM combo_stock_record
        WHERE combo_product_id = $1 AND warehouse_id = $2
        FOR UPDATE
        ",
    )
    .bind(combo_product_id)
    .bind(warehouse_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Create the combo stock record for a pair if absent, then lock and return it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn ensure_combo_stock_record(
    conn: &mut PgConnection,
    combo_product_id: ComboProductId,
    warehouse_id: WarehouseId,
) -> Result<ComboStockRecord, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO combo_stock_record (combo_product_id, warehouse_id)
        VALUES ($1, $2)
        ON CONFLICT (combo_product_id, warehouse_id) DO NOTHING
        ",
    )
    .bind(combo_product_id)
    .bind(warehouse_id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, ComboStockRecordRow>(
        r"
        SELECT combo_product_id, warehouse_id, finished, shipped, created_at, updated_at
        FROM combo_stock_record
        WHERE combo_product_id = $1 AND warehouse_id = $2
        FOR UPDATE
        ",
    )
    .bind(combo_product_id)
    .bind(warehouse_id)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

// =============================================================================
// Counter Adjustment
// =============================================================================

/// Apply a signed delta to one counter of a base stock record.
///
/// Positive deltas upsert so that credits can land on pairs with no record
/// yet; negative deltas require the row to exist (the engine locked it and
/// verified sufficient stock before calling).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, or
/// `RepositoryError::DataCorruption` if a decremented row is missing.
pub async fn apply_stock_delta(
    conn: &mut PgConnection,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    bucket: StockBucket,
    delta: i64,
) -> Result<(), RepositoryError> {
    let column = bucket_column(bucket);

    if delta >= 0 {
        let sql = format!(
            "INSERT INTO stock_record (product_id, warehouse_id, {column}) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (product_id, warehouse_id) \
             DO UPDATE SET {column} = stock_record.{column} + EXCLUDED.{column}, updated_at = now()"
        );
        sqlx::query(&sql)
            .bind(product_id)
            .bind(warehouse_id)
            .bind(delta)
            .execute(conn)
            .await?;
    } else {
        let sql = format!(
            "UPDATE stock_record \
             SET {column} = {column} + $3, updated_at = now() \
             WHERE product_id = $1 AND warehouse_id = $2"
        );
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(warehouse_id)
            .bind(delta)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "stock record for product {product_id} in warehouse {warehouse_id} missing during adjustment"
            )));
        }
    }

    Ok(())
}

/// Apply a signed delta to one counter of a combo stock record.
///
/// Combos only carry `finished` and `shipped` buckets.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` for a bucket combos do not have
/// or a missing decremented row, `RepositoryError::Database` if the query
/// fails.
pub async fn apply_combo_stock_delta(
    conn: &mut PgConnection,
    combo_product_id: ComboProductId,
    warehouse_id: WarehouseId,
    bucket: StockBucket,
    delta: i64,
) -> Result<(), RepositoryError> {
    let column = match bucket {
        StockBucket::Finished => "finished",
        StockBucket::Shipped => "shipped",
        StockBucket::InTransit | StockBucket::SemiFinished => {
            return Err(RepositoryError::DataCorruption(format!(
                "combo stock has no {bucket} bucket"
            )));
        }
    };

    if delta >= 0 {
        let sql = format!(
            "INSERT INTO combo_stock_record (combo_product_id, warehouse_id, {column}) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (combo_product_id, warehouse_id) \
             DO UPDATE SET {column} = combo_stock_record.{column} + EXCLUDED.{column}, updated_at = now()"
        );
        sqlx::query(&sql)
            .bind(combo_product_id)
            .bind(warehouse_id)
            .bind(delta)
            .execute(conn)
            .await?;
    } else {
        let sql = format!(
            "UPDATE combo_stock_record \
             SET {column} = {column} + $3, updated_at = now() \
             WHERE combo_product_id = $1 AND warehouse_id = $2"
        );
        let result = sqlx::query(&sql)
            .bind(combo_product_id)
            .bind(warehouse_id)
            .bind(delta)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "combo stock record for combo {combo_product_id} in warehouse {warehouse_id} missing during adjustment"
            )));
        }
    }

    Ok(())
}

// =============================================================================
// Stock Queries (no locking)
// =============================================================================

/// Get the stock record for a pair, if it exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_stock(
    executor: impl PgExecutor<'_>,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<StockRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, StockRecordRow>(
        r"
        SELECT product_id, warehouse_id, in_transit, semi_finished, finished, shipped,
               created_at, updated_at
        FROM stock_record
        WHERE product_id = $1 AND warehouse_id = $2
        ",
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// List all stock records in a warehouse, most recently touched first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_stock_for_warehouse(
    executor: impl PgExecutor<'_>,
    warehouse_id: WarehouseId,
) -> Result<Vec<StockRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, StockRecordRow>(
        r"
        SELECT product_id, warehouse_id, in_transit, semi_finished, finished, shipped,
               created_at, updated_at
        FROM stock_record
        WHERE warehouse_id = $1
        ORDER BY updated_at DESC
        ",
    )
    .bind(warehouse_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Get the combo stock record for a pair, if it exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_combo_stock(
    executor: impl PgExecutor<'_>,
    combo_product_id: ComboProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<ComboStockRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, ComboStockRecordRow>(
        r"
        SELECT combo_product_id, warehouse_id, finished, shipped, created_at, updated_at
        FROM combo_stock_record
        WHERE combo_product_id = $1 AND warehouse_id = $2
        ",
    )
    .bind(combo_product_id)
    .bind(warehouse_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// List all combo stock records in a warehouse, most recently touched first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_combo_stock_for_warehouse(
    executor: impl PgExecutor<'_>,
    warehouse_id: WarehouseId,
) -> Result<Vec<ComboStockRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, ComboStockRecordRow>(
        r"
        SELECT combo_product_id, warehouse_id, finished, shipped, created_at, updated_at
        FROM combo_stock_record
        WHERE warehouse_id = $1
        ORDER BY updated_at DESC
        ",
    )
    .bind(warehouse_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Aggregate base and combo counters per warehouse.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn warehouse_summaries(pool: &sqlx::PgPool) -> Result<Vec<WarehouseSummary>, RepositoryError> {
    let base_rows = sqlx::query_as::<_, BaseSummaryRow>(
        r"
        SELECT w.id AS warehouse_id,
               w.name AS warehouse_name,
               COUNT(s.product_id) AS total_products,
               COALESCE(SUM(s.in_transit), 0) AS total_in_transit,
               COALESCE(SUM(s.semi_finished), 0) AS total_semi_finished,
               COALESCE(SUM(s.finished), 0) AS total_finished,
               COALESCE(SUM(s.shipped), 0) AS total_shipped
        FROM warehouse w
        LEFT JOIN stock_record s ON s.warehouse_id = w.id
        GROUP BY w.id, w.name
        ORDER BY w.id
        ",
    )
    .fetch_all(pool)
    .await?;

    let combo_rows = sqlx::query_as::<_, ComboSummaryRow>(
        r"
        SELECT w.id AS warehouse_id,
               COUNT(c.combo_product_id) AS total_combo_products,
               COALESCE(SUM(c.finished), 0) AS total_combo_finished,
               COALESCE(SUM(c.shipped), 0) AS total_combo_shipped
        FROM warehouse w
        LEFT JOIN combo_stock_record c ON c.warehouse_id = w.id
        GROUP BY w.id
        ",
    )
    .fetch_all(pool)
    .await?;

    let combo_by_warehouse: std::collections::HashMap<i32, ComboSummaryRow> = combo_rows
        .into_iter()
        .map(|row| (row.warehouse_id, row))
        .collect();

    Ok(base_rows
        .into_iter()
        .map(|base| {
            let combo = combo_by_warehouse.get(&base.warehouse_id);
            WarehouseSummary {
                warehouse_id: WarehouseId::new(base.warehouse_id),
                warehouse_name: base.warehouse_name,
                total_products: base.total_products,
                total_in_transit: base.total_in_transit,
                total_semi_finished: base.total_semi_finished,
                total_finished: base.total_finished,
                total_shipped: base.total_shipped,
                total_combo_products: combo.map_or(0, |c| c.total_combo_products),
                total_combo_finished: combo.map_or(0, |c| c.total_combo_finished),
                total_combo_shipped: combo.map_or(0, |c| c.total_combo_shipped),
            }
        })
        .collect())
}
