//! Transaction log and batch shipment models.
//!
//! The transaction log is the sole audit trail: append-only, never mutated
//! or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packhouse_core::{
    ComboProductId, ProductId, StockBucket, TransactionId, TransitionType, WarehouseId,
};

/// The item a transaction row references: a base product or a combo,
/// mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionItem {
    /// Base product reference.
    Base {
        /// The product the transaction mutated.
        product_id: ProductId,
    },
    /// Combo product reference.
    Combo {
        /// The combo the transaction mutated.
        combo_product_id: ComboProductId,
    },
}

/// One immutable row of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// The base or combo item mutated.
    pub item: TransactionItem,
    /// The warehouse the mutation happened in.
    pub warehouse_id: WarehouseId,
    /// Which state transition produced this row.
    pub transition: TransitionType,
    /// Bucket quantity was taken from, when applicable.
    pub from_bucket: Option<StockBucket>,
    /// Bucket quantity was moved to, when applicable.
    pub to_bucket: Option<StockBucket>,
    /// Quantity moved. Always positive.
    pub quantity: i32,
    /// Shared batch identifier for batch shipment lines.
    pub batch_id: Option<Uuid>,
    /// Optional free-text note from the operator.
    pub note: Option<String>,
    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for appending a transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The base or combo item mutated.
    pub item: TransactionItem,
    /// The warehouse the mutation happened in.
    pub warehouse_id: WarehouseId,
    /// Which state transition produced this row.
    pub transition: TransitionType,
    /// Bucket quantity was taken from, when applicable.
    pub from_bucket: Option<StockBucket>,
    /// Bucket quantity was moved to, when applicable.
    pub to_bucket: Option<StockBucket>,
    /// Quantity moved. Always positive.
    pub quantity: i32,
    /// Shared batch identifier for batch shipment lines.
    pub batch_id: Option<Uuid>,
    /// Optional free-text note from the operator.
    pub note: Option<String>,
}

/// Filter criteria for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Filter by base product.
    pub product_id: Option<ProductId>,
    /// Filter by combo product.
    pub combo_product_id: Option<ComboProductId>,
    /// Filter by transition type.
    pub transition: Option<TransitionType>,
    /// Filter by batch identifier.
    pub batch_id: Option<Uuid>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}

/// Summary record for a batch shipment, covering only its successful lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchShipment {
    /// Shared identifier stamped on every line's transaction row.
    pub batch_id: Uuid,
    /// The warehouse the batch shipped from.
    pub warehouse_id: WarehouseId,
    /// Who triggered the batch, free-text.
    pub operator: Option<String>,
    /// Number of successful lines.
    pub total_lines: i32,
    /// Sum of successful line quantities.
    pub total_quantity: i32,
    /// Optional free-text note.
    pub note: Option<String>,
    /// When the batch was recorded.
    pub created_at: DateTime<Utc>,
}
