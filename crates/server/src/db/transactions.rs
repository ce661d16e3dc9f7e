//! Append-only transaction log and batch shipment records.
//!
//! Transaction rows are only ever inserted. There is no update or delete
//! path anywhere in the crate.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use packhouse_core::{
    ComboProductId, ProductId, StockBucket, TransactionId, TransitionType, WarehouseId,
};

use super::RepositoryError;
use crate::models::transaction::{
    BatchShipment, InventoryTransaction, NewTransaction, TransactionFilter, TransactionItem,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for transaction queries.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    product_id: Option<i32>,
    combo_product_id: Option<i32>,
    warehouse_id: i32,
    transition_type: String,
    from_bucket: Option<String>,
    to_bucket: Option<String>,
    quantity: i32,
    batch_id: Option<Uuid>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for InventoryTransaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let item = match (row.product_id, row.combo_product_id) {
            (Some(product_id), None) => TransactionItem::Base {
                product_id: ProductId::new(product_id),
            },
            (None, Some(combo_product_id)) => TransactionItem::Combo {
                combo_product_id: ComboProductId::new(combo_product_id),
            },
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "transaction {} does not reference exactly one item",
                    row.id
                )));
            }
        };

        let transition = row
            .transition_type
            .parse::<TransitionType>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let from_bucket = row
            .from_bucket
            .as_deref()
            .map(str::parse::<StockBucket>)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let to_bucket = row
            .to_bucket
            .as_deref()
            .map(str::parse::<StockBucket>)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: TransactionId::new(row.id),
            item,
            warehouse_id: WarehouseId::new(row.warehouse_id),
            transition,
            from_bucket,
            to_bucket,
            quantity: row.quantity,
            batch_id: row.batch_id,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for batch shipment queries.
#[derive(Debug, sqlx::FromRow)]
struct BatchShipmentRow {
    batch_id: Uuid,
    warehouse_id: i32,
    operator: Option<String>,
    total_lines: i32,
    total_quantity: i32,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BatchShipmentRow> for BatchShipment {
    fn from(row: BatchShipmentRow) -> Self {
        Self {
            batch_id: row.batch_id,
            warehouse_id: WarehouseId::new(row.warehouse_id),
            operator: row.operator,
            total_lines: row.total_lines,
            total_quantity: row.total_quantity,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

const TRANSACTION_COLUMNS: &str = "id, product_id, combo_product_id, warehouse_id, \
     transition_type, from_bucket, to_bucket, quantity, batch_id, note, created_at";

// =============================================================================
// Transaction Log
// =============================================================================

/// Append one transaction row and return its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_transaction(
    conn: &mut PgConnection,
    new: &NewTransaction,
) -> Result<TransactionId, RepositoryError> {
    let (product_id, combo_product_id) = match new.item {
        TransactionItem::Base { product_id } => (Some(product_id.as_i32()), None),
        TransactionItem::Combo { combo_product_id } => (None, Some(combo_product_id.as_i32())),
    };

    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO inventory_transaction (
            product_id, combo_product_id, warehouse_id, transition_type,
            from_bucket, to_bucket, quantity, batch_id, note
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        ",
    )
    .bind(product_id)
    .bind(combo_product_id)
    .bind(new.warehouse_id)
    .bind(new.transition.as_str())
    .bind(new.from_bucket.map(|b| b.as_str()))
    .bind(new.to_bucket.map(|b| b.as_str()))
    .bind(new.quantity)
    .bind(new.batch_id)
    .bind(new.note.as_deref())
    .fetch_one(conn)
    .await?;

    Ok(TransactionId::new(id))
}

/// List transactions matching a filter, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, or
/// `RepositoryError::DataCorruption` if a stored row is malformed.
pub async fn list_transactions(
    executor: impl PgExecutor<'_>,
    filter: &TransactionFilter,
) -> Result<Vec<InventoryTransaction>, RepositoryError> {
    let limit = filter.limit.unwrap_or(100);
    let offset = filter.offset.unwrap_or(0);

    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        r"
        SELECT {TRANSACTION_COLUMNS}
        FROM inventory_transaction
        WHERE
            ($1::int IS NULL OR warehouse_id = $1)
            AND ($2::int IS NULL OR product_id = $2)
            AND ($3::int IS NULL OR combo_product_id = $3)
            AND ($4::text IS NULL OR transition_type = $4)
            AND ($5::uuid IS NULL OR batch_id = $5)
        ORDER BY created_at DESC, id DESC
        LIMIT $6 OFFSET $7
        "
    ))
    .bind(filter.warehouse_id.map(|w| w.as_i32()))
    .bind(filter.product_id.map(|p| p.as_i32()))
    .bind(filter.combo_product_id.map(|c| c.as_i32()))
    .bind(filter.transition.map(|t| t.as_str()))
    .bind(filter.batch_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// List every transaction recorded under one batch id, in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, or
/// `RepositoryError::DataCorruption` if a stored row is malformed.
pub async fn transactions_for_batch(
    executor: impl PgExecutor<'_>,
    batch_id: Uuid,
) -> Result<Vec<InventoryTransaction>, RepositoryError> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        r"
        SELECT {TRANSACTION_COLUMNS}
        FROM inventory_transaction
        WHERE batch_id = $1
        ORDER BY id
        "
    ))
    .bind(batch_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// Batch Shipments
// =============================================================================

/// Persist a batch shipment summary.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_batch_shipment(
    conn: &mut PgConnection,
    batch_id: Uuid,
    warehouse_id: WarehouseId,
    operator: Option<&str>,
    total_lines: i32,
    total_quantity: i32,
    note: Option<&str>,
) -> Result<BatchShipment, RepositoryError> {
    let row = sqlx::query_as::<_, BatchShipmentRow>(
        r"
        INSERT INTO batch_shipment (
            batch_id, warehouse_id, operator, total_lines, total_quantity, note
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING batch_id, warehouse_id, operator, total_lines, total_quantity, note, created_at
        ",
    )
    .bind(batch_id)
    .bind(warehouse_id)
    .bind(operator)
    .bind(total_lines)
    .bind(total_quantity)
    .bind(note)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

/// Get a batch shipment summary by batch id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_batch_shipment(
    executor: impl PgExecutor<'_>,
    batch_id: Uuid,
) -> Result<Option<BatchShipment>, RepositoryError> {
    let row = sqlx::query_as::<_, BatchShipmentRow>(
        r"
        SELECT batch_id, warehouse_id, operator, total_lines, total_quantity, note, created_at
        FROM batch_shipment
        WHERE batch_id = $1
        ",
    )
    .bind(batch_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}
