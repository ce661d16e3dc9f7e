//! Stock ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use packhouse_core::{ComboProductId, ProductId, WarehouseId};

/// Per-(product, warehouse) quantity counters for a base item.
///
/// Created lazily on first receipt, never deleted. All counters are
/// non-negative; the database enforces this as a backstop behind the engine's
/// precondition checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// The product these counters belong to.
    pub product_id: ProductId,
    /// The warehouse these counters belong to.
    pub warehouse_id: WarehouseId,
    /// Ordered from a supplier, not yet arrived.
    pub in_transit: i32,
    /// Arrived, awaiting packaging.
    pub semi_finished: i32,
    /// Packaged, ready to ship.
    pub finished: i32,
    /// Shipped out. Monotonically increasing.
    pub shipped: i32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Per-(combo, warehouse) quantity counters.
///
/// Combos are assembled from base-item stock, not received externally, so
/// they carry no in-transit or semi-finished buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboStockRecord {
    /// The combo these counters belong to.
    pub combo_product_id: ComboProductId,
    /// The warehouse these counters belong to.
    pub warehouse_id: WarehouseId,
    /// Assembled, ready to ship.
    pub finished: i32,
    /// Shipped out. Monotonically increasing.
    pub shipped: i32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Aggregated stock counters for one warehouse, base and combo combined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseSummary {
    /// The warehouse being summarized.
    pub warehouse_id: WarehouseId,
    /// Warehouse display name.
    pub warehouse_name: String,
    /// Number of base products with a stock record here.
    pub total_products: i64,
    /// Sum of in-transit counters.
    pub total_in_transit: i64,
    /// Sum of semi-finished counters.
    pub total_semi_finished: i64,
    /// Sum of finished counters.
    pub total_finished: i64,
    /// Sum of shipped counters.
    pub total_shipped: i64,
    /// Number of combo products with a stock record here.
    pub total_combo_products: i64,
    /// Sum of combo finished counters.
    pub total_combo_finished: i64,
    /// Sum of combo shipped counters.
    pub total_combo_shipped: i64,
}
