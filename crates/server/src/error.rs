//! Unified error handling for the HTTP surface.
//!
//! Every engine error renders to a JSON body carrying the structured detail
//! (item, bucket, requested vs available) so the caller can show an
//! actionable message without re-deriving anything.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::engine::EngineError;

/// Application-level error type for the inventory service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Transition engine rejected the operation.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engine(engine) => match engine {
                EngineError::InsufficientStock { .. } | EngineError::ConfigurationMissing { .. } => {
                    StatusCode::CONFLICT
                }
                EngineError::InvalidQuantity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::UnknownItemOrWarehouse { .. } => StatusCode::NOT_FOUND,
                EngineError::ContentionTimeout => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Engine(engine) => engine_body(engine),
            Self::Database(RepositoryError::NotFound) => json!({
                "error": "not_found",
                "message": "not found",
            }),
            // Don't expose internal error details to clients
            Self::Database(_) => json!({
                "error": "internal",
                "message": "internal server error",
            }),
            Self::NotFound(detail) => json!({
                "error": "not_found",
                "message": detail,
            }),
            Self::BadRequest(detail) => json!({
                "error": "bad_request",
                "message": detail,
            }),
        }
    }
}

fn engine_body(engine: &EngineError) -> serde_json::Value {
    match engine {
        EngineError::InsufficientStock {
            item,
            bucket,
            requested,
            available,
        } => json!({
            "error": "insufficient_stock",
            "message": engine.to_string(),
            "detail": {
                "item": item,
                "bucket": bucket,
                "requested": requested,
                "available": available,
            },
        }),
        EngineError::InvalidQuantity { value } => json!({
            "error": "invalid_quantity",
            "message": engine.to_string(),
            "detail": { "value": value },
        }),
        EngineError::UnknownItemOrWarehouse { detail } => json!({
            "error": "unknown_item_or_warehouse",
            "message": detail,
        }),
        EngineError::ContentionTimeout => json!({
            "error": "contention_timeout",
            "message": engine.to_string(),
            "retryable": true,
        }),
        EngineError::ConfigurationMissing { detail } => json!({
            "error": "configuration_missing",
            "message": detail,
        }),
        EngineError::Repository(_) => json!({
            "error": "internal",
            "message": "internal server error",
        }),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Database(_) | Self::Engine(EngineError::Repository(_))
        ) {
            tracing::error!(error = %self, "request failed");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use packhouse_core::StockBucket;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("batch 01928".to_string());
        assert_eq!(err.to_string(), "Not found: batch 01928");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Engine(EngineError::InsufficientStock {
                item: "SKU-X".to_string(),
                bucket: StockBucket::Finished,
                requested: 5,
                available: 2,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Engine(EngineError::InvalidQuantity { value: 0 })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Engine(EngineError::UnknownItemOrWarehouse {
                detail: "product 9 does not exist".to_string(),
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Engine(EngineError::ContentionTimeout)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Engine(EngineError::ConfigurationMissing {
                detail: "combo COMBO-C has no components".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_insufficient_stock_body_carries_shortfall_detail() {
        let err = AppError::Engine(EngineError::InsufficientStock {
            item: "PKG-P".to_string(),
            bucket: StockBucket::Finished,
            requested: 2,
            available: 1,
        });
        let body = err.body();
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["detail"]["item"], "PKG-P");
        assert_eq!(body["detail"]["bucket"], "finished");
        assert_eq!(body["detail"]["requested"], 2);
        assert_eq!(body["detail"]["available"], 1);
    }

    #[test]
    fn test_contention_is_marked_retryable() {
        let body = AppError::Engine(EngineError::ContentionTimeout).body();
        assert_eq!(body["retryable"], true);
    }
}
