//! HTTP route handlers for the inventory service.
//!
//! The surface is JSON-only: base-item transitions and queries under
//! `/api/inventory`, combo operations under `/api/combos`, batch shipments
//! under `/api/shipments`.

pub mod combos;
pub mod inventory;
pub mod shipments;

use axum::Router;

use crate::state::AppState;

/// Build the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(inventory::router())
        .merge(combos::router())
        .merge(shipments::router())
}
