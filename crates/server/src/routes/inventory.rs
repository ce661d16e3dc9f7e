//! Base-item inventory route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packhouse_core::{ProductId, TransactionId, TransitionType, WarehouseId};

use crate::db::{stock, transactions};
use crate::engine::availability::Availability;
use crate::error::AppError;
use crate::models::stock::{StockRecord, WarehouseSummary};
use crate::models::transaction::{InventoryTransaction, TransactionFilter};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body for receive, confirm, package, and unpack requests.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target product.
    pub product_id: ProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
    /// Quantity to move. Must be positive.
    pub quantity: i32,
}

/// Body for ship requests.
#[derive(Debug, Deserialize)]
pub struct ShipRequest {
    /// Target product.
    pub product_id: ProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
    /// Quantity to ship. Must be positive.
    pub quantity: i32,
    /// Optional operator note recorded on the transaction.
    pub note: Option<String>,
}

/// Response for every successful transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// The appended transaction-log row.
    pub transaction_id: TransactionId,
}

/// Query parameters for the availability endpoint.
///
/// The transition arrives as its snake_case string form and is parsed
/// explicitly so an unknown value yields a clean 400.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Which transition to compute the bound for.
    pub transition: String,
    /// Target product.
    pub product_id: ProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
}

/// Availability response: the bound and what causes it.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Largest quantity the transition can move right now.
    pub max: i64,
    /// SKU of the binding packaging material or component, when one binds.
    pub limiting_factor: Option<String>,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        Self {
            max: availability.max,
            limiting_factor: availability.limiting_factor,
        }
    }
}

/// Query parameters for the single-pair stock endpoint.
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    /// Target product.
    pub product_id: ProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
}

/// Stock counters for one (product, warehouse) pair.
///
/// Pairs with no persisted record report zeroes; reading never creates
/// records.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    /// Target product.
    pub product_id: ProductId,
    /// Target warehouse.
    pub warehouse_id: WarehouseId,
    /// Ordered, not yet arrived.
    pub in_transit: i32,
    /// Arrived, awaiting packaging.
    pub semi_finished: i32,
    /// Packaged, ready to ship.
    pub finished: i32,
    /// Shipped out.
    pub shipped: i32,
}

impl StockResponse {
    fn from_record(record: &StockRecord) -> Self {
        Self {
            product_id: record.product_id,
            warehouse_id: record.warehouse_id,
            in_transit: record.in_transit,
            semi_finished: record.semi_finished,
            finished: record.finished,
            shipped: record.shipped,
        }
    }

    const fn zeroed(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
            in_transit: 0,
            semi_finished: 0,
            finished: 0,
            shipped: 0,
        }
    }
}

/// Query parameters for the transaction listing.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    /// Filter by warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Filter by base product.
    pub product_id: Option<ProductId>,
    /// Filter by combo product.
    pub combo_product_id: Option<packhouse_core::ComboProductId>,
    /// Filter by transition type (snake_case string form).
    pub transition: Option<String>,
    /// Filter by batch identifier.
    pub batch_id: Option<Uuid>,
    /// Maximum number of results (default 100).
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}

// =============================================================================
// Router
// =============================================================================

/// Build the base-item inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inventory/receive", post(receive))
        .route("/api/inventory/receive/confirm", post(confirm_receipt))
        .route("/api/inventory/package", post(package))
        .route("/api/inventory/unpack", post(unpack))
        .route("/api/inventory/ship", post(ship))
        .route("/api/inventory/availability", get(availability))
        .route("/api/inventory/stock", get(stock_for_pair))
        .route("/api/inventory/stock/{warehouse_id}", get(stock_for_warehouse))
        .route("/api/inventory/summary", get(summary))
        .route("/api/inventory/transactions", get(list_transactions))
}

// =============================================================================
// Transition Handlers
// =============================================================================

/// Book quantity in transit from a supplier.
async fn receive(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .receive(request.product_id, request.warehouse_id, request.quantity)
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Confirm arrival of in-transit quantity.
async fn confirm_receipt(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .confirm_receipt(request.product_id, request.warehouse_id, request.quantity)
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Package semi-finished goods, consuming packaging.
async fn package(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .package(request.product_id, request.warehouse_id, request.quantity)
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Unpack finished goods, restoring packaging.
async fn unpack(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .unpack(request.product_id, request.warehouse_id, request.quantity)
        .await?;
    Ok(Json(TransitionResponse { transaction_id }))
}

/// Ship finished goods.
async fn ship(
    State(state): State<AppState>,
    Json(request): Json<ShipRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transaction_id = state
        .engine()
        .ship(
            request.product_id,
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

/// Maximum feasible quantity for a base-item transition.
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let transition = query
        .transition
        .parse::<TransitionType>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let engine = state.engine();
    let availability = match transition {
        TransitionType::Receive => {
            engine.max_receive(query.product_id, query.warehouse_id).await?
        }
        TransitionType::Package => {
            engine.max_package(query.product_id, query.warehouse_id).await?
        }
        TransitionType::Unpack => engine.max_unpack(query.product_id, query.warehouse_id).await?,
        TransitionType::Ship => engine.max_ship(query.product_id, query.warehouse_id).await?,
        TransitionType::Assemble | TransitionType::Disassemble => {
            return Err(AppError::BadRequest(format!(
                "transition {transition} does not apply to base items"
            )));
        }
    };
    Ok(Json(availability.into()))
}

/// Stock counters for one (product, warehouse) pair.
async fn stock_for_pair(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<StockResponse>, AppError> {
    let record = stock::get_stock(state.pool(), query.product_id, query.warehouse_id).await?;
    let response = record.as_ref().map_or_else(
        || StockResponse::zeroed(query.product_id, query.warehouse_id),
        StockResponse::from_record,
    );
    Ok(Json(response))
}

/// All stock records in a warehouse, most recently touched first.
async fn stock_for_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
) -> Result<Json<Vec<StockRecord>>, AppError> {
    let records = stock::list_stock_for_warehouse(state.pool(), warehouse_id).await?;
    Ok(Json(records))
}

/// Aggregated counters per warehouse, base and combo combined.
async fn summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<WarehouseSummary>>, AppError> {
    let summaries = stock::warehouse_summaries(state.pool()).await?;
    Ok(Json(summaries))
}

/// Filterable transaction log listing, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<InventoryTransaction>>, AppError> {
    let transition = query
        .transition
        .as_deref()
        .map(str::parse::<TransitionType>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let filter = TransactionFilter {
        warehouse_id: query.warehouse_id,
        product_id: query.product_id,
        combo_product_id: query.combo_product_id,
        transition,
        batch_id: query.batch_id,
        limit: query.limit,
        offset: query.offset,
    };
    let transactions = transactions::list_transactions(state.pool(), &filter).await?;
    Ok(Json(transactions))
}
