//! Batch shipment route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packhouse_core::WarehouseId;

use crate::db::transactions;
use crate::engine::batch::{BatchShipLine, BatchShipOutcome};
use crate::error::AppError;
use crate::models::transaction::{BatchShipment, InventoryTransaction};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body for a batch shipment request.
#[derive(Debug, Deserialize)]
pub struct BatchShipRequest {
    /// The warehouse every line ships from.
    pub warehouse_id: WarehouseId,
    /// Lines to ship, processed in order. Each references a base product
    /// (`product_id`) or a combo (`combo_product_id`).
    pub lines: Vec<BatchShipLine>,
    /// Who triggered the batch, free-text.
    pub operator: Option<String>,
    /// Optional note recorded on the batch summary.
    pub note: Option<String>,
}

/// Batch detail: the summary record plus its transaction-line projection.
#[derive(Debug, Serialize)]
pub struct BatchDetailResponse {
    /// The persisted batch summary.
    pub record: BatchShipment,
    /// Transaction rows recorded under this batch id, in insertion order.
    pub lines: Vec<InventoryTransaction>,
}

// =============================================================================
// Router
// =============================================================================

/// Build the shipments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipments/batch", post(ship_batch))
        .route("/api/shipments/batch/{batch_id}", get(batch_detail))
}

// =============================================================================
// Handlers
// =============================================================================

/// Ship a batch of base and combo lines, committing whatever subset succeeds.
async fn ship_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchShipRequest>,
) -> Result<Json<BatchShipOutcome>, AppError> {
    let outcome = state
        .engine()
        .ship_batch(
            request.warehouse_id,
            request.lines,
            request.operator,
            request.note,
        )
        .await?;
    Ok(Json(outcome))
}

/// Fetch a batch summary and its line projection.
async fn batch_detail(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchDetailResponse>, AppError> {
    let record = transactions::get_batch_shipment(state.pool(), batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {batch_id} does not exist")))?;
    let lines = transactions::transactions_for_batch(state.pool(), batch_id).await?;

    Ok(Json(BatchDetailResponse { record, lines }))
}
