//! Batch shipment coordinator.
//!
//! A batch groups an arbitrary mix of base and combo ship lines under one
//! shared batch id. Lines are processed sequentially, each as its own atomic
//! transition, and the batch deliberately commits whatever subset succeeds:
//! partial failure is a feature of the batch level, not a bug, in contrast to
//! the strict all-or-nothing semantics inside a single transition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packhouse_core::{ItemRef, TransactionId, WarehouseId};

use crate::db::transactions;
use crate::models::transaction::BatchShipment;

use super::{EngineError, TransitionEngine, lock_error};

/// One requested line of a batch shipment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchShipLine {
    /// The base or combo item to ship.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Quantity to ship.
    pub quantity: i32,
}

/// A line that shipped.
#[derive(Debug, Clone, Serialize)]
pub struct BatchLineSuccess {
    /// The item that shipped.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Quantity shipped.
    pub quantity: i32,
    /// The transaction row recording the ship.
    pub transaction_id: TransactionId,
}

/// A line that was rejected, with the reason it failed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchLineFailure {
    /// The item that failed to ship.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Human-readable failure reason (typed error rendered to text).
    pub reason: String,
}

/// Outcome of a batch shipment: the shared id, per-line results, and the
/// persisted summary record when at least one line succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchShipOutcome {
    /// Shared identifier stamped on every successful line's transaction.
    pub batch_id: Uuid,
    /// Lines that shipped, in request order.
    pub succeeded: Vec<BatchLineSuccess>,
    /// Lines that were rejected, in request order.
    pub failed: Vec<BatchLineFailure>,
    /// Summary record; `None` when every line failed.
    pub record: Option<BatchShipment>,
}

/// Count and total quantity over the successful lines.
fn totals(succeeded: &[BatchLineSuccess]) -> (i32, i32) {
    let lines = i32::try_from(succeeded.len()).unwrap_or(i32::MAX);
    let quantity: i64 = succeeded.iter().map(|s| i64::from(s.quantity)).sum();
    (lines, i32::try_from(quantity).unwrap_or(i32::MAX))
}

impl TransitionEngine {
    /// Ship a batch of base and combo lines from one warehouse.
    ///
    /// Every line is attempted independently; a failed line never aborts the
    /// remaining ones. A [`BatchShipment`] summary covering only the
    /// successful lines is persisted when at least one line succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] if the warehouse does
    /// not exist, or a repository error if the summary record cannot be
    /// persisted. Per-line failures are reported in the outcome, not as an
    /// error.
    #[tracing::instrument(skip(self, lines, operator, note), fields(line_count = lines.len()))]
    pub async fn ship_batch(
        &self,
        warehouse_id: WarehouseId,
        lines: Vec<BatchShipLine>,
        operator: Option<String>,
        note: Option<String>,
    ) -> Result<BatchShipOutcome, EngineError> {
        self.warehouse_or_unknown(warehouse_id).await?;

        let batch_id = Uuid::new_v4();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for line in lines {
            let result = match line.item {
                ItemRef::Base { product_id } => {
                    self.ship_with_batch(product_id, warehouse_id, line.quantity, None, Some(batch_id))
                        .await
                }
                ItemRef::Combo { combo_product_id } => {
                    self.ship_combo_with_batch(
                        combo_product_id,
                        warehouse_id,
                        line.quantity,
                        None,
                        Some(batch_id),
                    )
                    .await
                }
            };

            match result {
                Ok(transaction_id) => succeeded.push(BatchLineSuccess {
                    item: line.item,
                    quantity: line.quantity,
                    transaction_id,
                }),
                Err(err) => {
                    tracing::warn!(item = %line.item, quantity = line.quantity, error = %err, "batch line failed");
                    failed.push(BatchLineFailure {
                        item: line.item,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let record = if succeeded.is_empty() {
            None
        } else {
            let (total_lines, total_quantity) = totals(&succeeded);
            let mut conn = self
                .pool()
                .acquire()
                .await
                .map_err(|e| lock_error(crate::db::RepositoryError::Database(e)))?;
            let record = transactions::insert_batch_shipment(
                &mut conn,
                batch_id,
                warehouse_id,
                operator.as_deref(),
                total_lines,
                total_quantity,
                note.as_deref(),
            )
            .await
            .map_err(lock_error)?;
            Some(record)
        };

        tracing::info!(
            %batch_id,
            %warehouse_id,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "batch shipment processed"
        );

        Ok(BatchShipOutcome {
            batch_id,
            succeeded,
            failed,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use packhouse_core::{ComboProductId, ProductId};

    use super::*;

    #[test]
    fn test_totals_cover_only_successful_lines() {
        // Batch of {X: 5 shipped} with a failed combo line: the summary
        // counts one line and five units.
        let succeeded = vec![BatchLineSuccess {
            item: ItemRef::base(ProductId::new(1)),
            quantity: 5,
            transaction_id: TransactionId::new(10),
        }];
        let (lines, quantity) = totals(&succeeded);
        assert_eq!(lines, 1);
        assert_eq!(quantity, 5);
    }

    #[test]
    fn test_totals_empty() {
        assert_eq!(totals(&[]), (0, 0));
    }

    #[test]
    fn test_totals_mixed_lines() {
        let succeeded = vec![
            BatchLineSuccess {
                item: ItemRef::base(ProductId::new(1)),
                quantity: 5,
                transaction_id: TransactionId::new(10),
            },
            BatchLineSuccess {
                item: ItemRef::combo(ComboProductId::new(2)),
                quantity: 2,
                transaction_id: TransactionId::new(11),
            },
        ];
        assert_eq!(totals(&succeeded), (2, 7));
    }

    #[test]
    fn test_line_json_shape_discriminates_base_and_combo() {
        let base: BatchShipLine =
            serde_json::from_str(r#"{"product_id": 3, "quantity": 5}"#).expect("base line");
        assert!(matches!(base.item, ItemRef::Base { .. }));

        let combo: BatchShipLine =
            serde_json::from_str(r#"{"combo_product_id": 4, "quantity": 2}"#).expect("combo line");
        assert!(matches!(combo.item, ItemRef::Combo { .. }));
    }
}
