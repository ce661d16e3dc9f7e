//! Combo product route handlers: assembly, disassembly, shipping, stock.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use packhouse_core::{ComboProductId, TransitionType, WarehouseId};

use crate::db::stock;
use crate::error::AppError;
use crate::models::stock::ComboStockRecord;
use crate::routes::inventory::{AvailabilityResponse, TransitionResponse};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body for combo assemble, disassemble, and ship requests.
#[derive(Debug, Deserialize)]
pub struct ComboTransitionRequest {
    /// Target combo product.
    pub combo_product_id: ComboProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
    /// Quantity to move. Must be positive.
    pub quantity: i32,
    /// Optional operator note recorded on the transaction.
    pub note: Option<String>,
}

/// Query parameters for the combo availability endpoint.
///
/// The transition arrives as its snake_case string form and is parsed
/// explicitly so an unknown value yields a clean 400.
#[derive(Debug, Deserialize)]
pub struct ComboAvailabilityQuery {
    /// Which transition to compute the bound for.
    pub transition: String,
    /// Target combo product.
    pub combo_product_id: ComboProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
}

/// Query parameters for the single-pair combo stock endpoint.
#[derive(Debug, Deserialize)]
pub struct ComboStockQuery {
    /// Target combo product.
    pub combo_product_id: ComboProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
}

/// Combo stock counters plus the advisory assemblable bound.
#[derive(Debug, Serialize)]
pub struct ComboStockResponse {
    /// Target combo product.
    pub combo_product_id: ComboProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
    /// Assembled, ready to ship.
    pub finished: i32,
    /// Shipped out.
    pub shipped: i32,
    /// How many more could be assembled from current component and
    /// packaging stock.
    pub available_to_assemble: i64,
}

// =============================================================================
// Router
// =============================================================================

/// Build the combo router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/combos/assemble", post(assemble))
        .route("/api/combos/disassemble", post(disassemble))
        .route("/api/combos/ship", post(ship))
        .route("/api/combos/availability", get(availability))
        .route("/api/combos/stock", get(stock_for_pair))
        .route("/api/combos/stock/{warehouse_id}", get(stock_for_warehouse))
}

// =============================================================================
// Transition Handlers
// =============================================================================

/// Assemble combos from component stock.
async fn assemble(
    State(state): State<AppState>,
    Json(request): Json<ComboTransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .assemble(
            request.combo_product_id,
            request.warehouse_id,
            request.quantity,
            request.note,
        )
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Disassemble combos back into component stock.
async fn disassemble(
    State(state): State<AppState>,
    Json(request): Json<ComboTransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .disassemble(
            request.combo_product_id,
            request.warehouse_id,
            request.quantity,
            request.note,
        )
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Ship assembled combos.
async fn ship(
    State(state): State<AppState>,
    Json(request): Json<ComboTransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .ship_combo(
            request.combo_product_id,
            request.warehouse_id,
            request.quantity,
            request.note,
        )
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

// =============================================================================
// Query Handlers
// =============================================================================

/// Maximum feasible quantity for a combo transition.
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<ComboAvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let transition = query
        .transition
        .parse::<TransitionType>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let engine = state.engine();
    let availability = match transition {
        TransitionType::Assemble => {
            engine
                .max_assemble(query.combo_product_id, query.warehouse_id)
                .await?
        }
        TransitionType::Disassemble => {
            engine
                .max_disassemble(query.combo_product_id, query.warehouse_id)
                .await?
        }
        TransitionType::Ship => {
            engine
                .max_ship_combo(query.combo_product_id, query.warehouse_id)
                .await?
        }
        TransitionType::Receive | TransitionType::Package | TransitionType::Unpack => {
            return Err(AppError::BadRequest(format!(
                "transition {transition} does not apply to combo items"
            )));
        }
    };
    Ok(Json(availability.into()))
}

/// Combo stock counters for one (combo, warehouse) pair, with the advisory
/// assemblable bound attached.
async fn stock_for_pair(
    State(state): State<AppState>,
    Query(query): Query<ComboStockQuery>,
) -> Result<Json<ComboStockResponse>, AppError> {
    let record =
        stock::get_combo_stock(state.pool(), query.combo_product_id, query.warehouse_id).await?;
    let available = state
        .engine()
        .max_assemble(query.combo_product_id, query.warehouse_id)
        .await?;

    Ok(Json(ComboStockResponse {
        combo_product_id: query.combo_product_id,
        warehouse_id: query.warehouse_id,
        finished: record.as_ref().map_or(0, |r| r.finished),
        shipped: record.as_ref().map_or(0, |r| r.shipped),
        available_to_assemble: available.max,
    }))
}

/// All combo stock records in a warehouse, each with its assemblable bound.
async fn stock_for_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
) -> Result<Json<Vec<ComboStockResponse>>, AppError> {
    let records: Vec<ComboStockRecord> =
        stock::list_combo_stock_for_warehouse(state.pool(), warehouse_id).await?;

    let mut responses = Vec::with_capacity(records.len());
    for record in records {
        let available = state
            .engine()
            .max_assemble(record.combo_product_id, warehouse_id)
            .await?;
        responses.push(ComboStockResponse {
            combo_product_id: record.combo_product_id,
            warehouse_id: record.warehouse_id,
            finished: record.finished,
            shipped: record.shipped,
            available_to_assemble: available.max,
        });
    }

    Ok(Json(responses))
}
