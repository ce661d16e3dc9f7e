//! The transition engine: every stock mutation funnels through here.
//!
//! Each transition executes as one database transaction:
//!
//! 1. `SET LOCAL lock_timeout` bounds the row-lock wait
//! 2. Every touched stock row is locked with `SELECT ... FOR UPDATE`, in
//!    ascending product-id order (combo rows after base rows), so that
//!    overlapping transitions cannot deadlock
//! 3. All preconditions are validated against the locked values by the pure
//!    planning layer - nothing has been mutated yet at this point
//! 4. The plan's counter deltas are applied and exactly one transaction-log
//!    row is appended
//!
//! A lock wait that exceeds the bound surfaces as the retryable
//! [`EngineError::ContentionTimeout`]; all other precondition failures are
//! typed, carry the full shortfall detail, and abort before any mutation.

pub mod availability;
pub mod batch;
pub mod plan;

use std::collections::HashMap;
use std::time::Duration;

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use packhouse_core::{ComboProductId, ProductId, StockBucket, TransactionId, WarehouseId};

use crate::db::{RepositoryError, catalog, stock, transactions};
use crate::models::catalog::{ComboProduct, PackagingRequirement, Product};
use crate::models::stock::StockRecord;
use crate::models::transaction::{NewTransaction, TransactionItem};

use availability::{Availability, ResourceLine};
use plan::{BaseCounters, ComboCounters, ComponentState, ItemState, RequirementState, TransitionPlan};

/// `PostgreSQL` SQLSTATE for a lock wait that exceeded `lock_timeout`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Domain errors surfaced by the transition engine.
///
/// Every variant carries enough structured detail for the caller to render
/// an actionable message without re-deriving anything. Only
/// `ContentionTimeout` is retryable.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A precondition found less stock than the transition needs.
    #[error("insufficient stock: {item} has {available} {bucket}, requested {requested}")]
    InsufficientStock {
        /// SKU of the item that is short.
        item: String,
        /// The bucket that is short.
        bucket: StockBucket,
        /// Quantity the transition needed from that bucket.
        requested: i64,
        /// Quantity actually available.
        available: i64,
    },

    /// Requested quantity was zero or negative.
    #[error("invalid quantity: {value} (must be a positive integer)")]
    InvalidQuantity {
        /// The rejected value.
        value: i64,
    },

    /// The referenced product, combo, or warehouse does not exist.
    #[error("unknown item or warehouse: {detail}")]
    UnknownItemOrWarehouse {
        /// Which reference failed to resolve.
        detail: String,
    },

    /// Row locks could not be acquired within the configured bound.
    /// Retryable: the caller may retry with backoff.
    #[error("stock rows are contended, retry the operation")]
    ContentionTimeout,

    /// The catalog configuration cannot support the transition.
    #[error("configuration missing: {detail}")]
    ConfigurationMissing {
        /// What is missing.
        detail: String,
    },

    /// Underlying repository failure.
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

/// Map repository errors, surfacing a lock-timeout SQLSTATE as contention.
fn lock_error(err: RepositoryError) -> EngineError {
    if let RepositoryError::Database(sqlx::Error::Database(db_err)) = &err
        && db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE)
    {
        return EngineError::ContentionTimeout;
    }
    EngineError::Repository(err)
}

/// The inventory transition engine.
///
/// Cheap to clone; holds a pool handle and the configured lock-wait bound.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    pool: PgPool,
    lock_timeout: Duration,
}

impl TransitionEngine {
    /// Create an engine over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Begin a transaction with the lock-wait bound applied.
    async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, EngineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| lock_error(RepositoryError::Database(e)))?;
        let statement = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| lock_error(RepositoryError::Database(e)))?;
        Ok(tx)
    }

    async fn commit(tx: sqlx::Transaction<'_, sqlx::Postgres>) -> Result<(), EngineError> {
        tx.commit()
            .await
            .map_err(|e| lock_error(RepositoryError::Database(e)))
    }

    // =========================================================================
    // Base-item transitions
    // =========================================================================

    /// Book quantity in transit from a supplier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on invalid quantity, unknown references, or
    /// repository failure.
    #[tracing::instrument(skip(self))]
    pub async fn receive(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let product = load_product(&mut tx, product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let record = stock::ensure_stock_record(&mut tx, product_id, warehouse_id)
            .await
            .map_err(lock_error)?;
        let item = item_state(&product, &record);
        let transition_plan = plan::plan_receive(&item, quantity)?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Base { product_id },
            quantity,
            None,
            None,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%product_id, %warehouse_id, quantity, "stock received in transit");
        Ok(id)
    }

    /// Confirm arrival: move quantity from in-transit to semi-finished.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] if less than `quantity` is
    /// in transit.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_receipt(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let product = load_product(&mut tx, product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let record = stock::ensure_stock_record(&mut tx, product_id, warehouse_id)
            .await
            .map_err(lock_error)?;
        let item = item_state(&product, &record);
        let transition_plan = plan::plan_confirm_receipt(&item, quantity)?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Base { product_id },
            quantity,
            None,
            None,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%product_id, %warehouse_id, quantity, "receipt confirmed");
        Ok(id)
    }

    /// Package semi-finished goods into finished form, consuming packaging.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] naming the item's own
    /// semi-finished stock or the first short packaging material. Nothing is
    /// consumed on failure.
    #[tracing::instrument(skip(self))]
    pub async fn package(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let product = load_product(&mut tx, product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let requirements = catalog::packaging_for_product(&mut *tx, product_id)
            .await
            .map_err(lock_error)?;
        let locked = lock_base_rows(
            &mut tx,
            warehouse_id,
            product_id,
            requirements.iter().map(|r| r.packaging_id),
        )
        .await?;

        let item = ItemState {
            product_id,
            sku: product.sku.clone(),
            counters: counters_of(locked.get(&product_id)),
        };
        let packaging = requirement_states(&requirements, &locked);
        let transition_plan = plan::plan_package(&item, &packaging, quantity)?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Base { product_id },
            quantity,
            None,
            None,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%product_id, %warehouse_id, quantity, "stock packaged");
        Ok(id)
    }

    /// Unpack finished goods back to semi-finished, restoring packaging.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] if less than `quantity` is
    /// finished.
    #[tracing::instrument(skip(self))]
    pub async fn unpack(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let product = load_product(&mut tx, product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let requirements = catalog::packaging_for_product(&mut *tx, product_id)
            .await
            .map_err(lock_error)?;
        let locked = lock_base_rows(
            &mut tx,
            warehouse_id,
            product_id,
            requirements.iter().map(|r| r.packaging_id),
        )
        .await?;

        let item = ItemState {
            product_id,
            sku: product.sku.clone(),
            counters: counters_of(locked.get(&product_id)),
        };
        let packaging = requirement_states(&requirements, &locked);
        let transition_plan = plan::plan_unpack(&item, &packaging, quantity)?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Base { product_id },
            quantity,
            None,
            None,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%product_id, %warehouse_id, quantity, "stock unpacked");
        Ok(id)
    }

    /// Ship finished goods. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] if less than `quantity` is
    /// finished.
    pub async fn ship(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
    ) -> Result<TransactionId, EngineError> {
        self.ship_with_batch(product_id, warehouse_id, quantity, note, None)
            .await
    }

    /// Ship finished goods, optionally stamping a batch id on the log row.
    #[tracing::instrument(skip(self, note))]
    pub(crate) async fn ship_with_batch(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
        batch_id: Option<Uuid>,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let product = load_product(&mut tx, product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let locked = lock_base_rows(&mut tx, warehouse_id, product_id, std::iter::empty()).await?;
        let item = ItemState {
            product_id,
            sku: product.sku.clone(),
            counters: counters_of(locked.get(&product_id)),
        };
        let transition_plan = plan::plan_ship(&item, quantity)?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Base { product_id },
            quantity,
            batch_id,
            note,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%product_id, %warehouse_id, quantity, "stock shipped");
        Ok(id)
    }

    // =========================================================================
    // Combo transitions
    // =========================================================================

    /// Assemble a combo from component semi-finished stock and combo
    /// packaging, as one atomic cross-item mutation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationMissing`] for a combo without
    /// components, or [`EngineError::InsufficientStock`] naming the first
    /// short component or packaging material. Nothing is consumed on failure.
    #[tracing::instrument(skip(self, note))]
    pub async fn assemble(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let combo = load_combo(&mut tx, combo_product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let components = catalog::components_for_combo(&mut *tx, combo_product_id)
            .await
            .map_err(lock_error)?;
        let requirements = catalog::packaging_for_combo(&mut *tx, combo_product_id)
            .await
            .map_err(lock_error)?;

        let locked = lock_rows(
            &mut tx,
            warehouse_id,
            components
                .iter()
                .map(|c| c.product_id)
                .chain(requirements.iter().map(|r| r.packaging_id)),
        )
        .await?;
        stock::ensure_combo_stock_record(&mut tx, combo_product_id, warehouse_id)
            .await
            .map_err(lock_error)?;

        let component_states = component_states(&components, &locked);
        let packaging = requirement_states(&requirements, &locked);
        let transition_plan = plan::plan_assemble(
            combo_product_id,
            &combo.sku,
            &component_states,
            &packaging,
            quantity,
        )?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Combo { combo_product_id },
            quantity,
            None,
            note,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%combo_product_id, %warehouse_id, quantity, "combo assembled");
        Ok(id)
    }

    /// Disassemble a combo, restoring component and packaging stock.
    /// Reverses [`TransitionEngine::assemble`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] if less than `quantity` of
    /// the combo is finished.
    #[tracing::instrument(skip(self, note))]
    pub async fn disassemble(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let combo = load_combo(&mut tx, combo_product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let components = catalog::components_for_combo(&mut *tx, combo_product_id)
            .await
            .map_err(lock_error)?;
        let requirements = catalog::packaging_for_combo(&mut *tx, combo_product_id)
            .await
            .map_err(lock_error)?;

        let locked = lock_rows(
            &mut tx,
            warehouse_id,
            components
                .iter()
                .map(|c| c.product_id)
                .chain(requirements.iter().map(|r| r.packaging_id)),
        )
        .await?;
        let combo_record = stock::lock_combo_stock_record(&mut tx, combo_product_id, warehouse_id)
            .await
            .map_err(lock_error)?;

        let component_states = component_states(&components, &locked);
        let packaging = requirement_states(&requirements, &locked);
        let transition_plan = plan::plan_disassemble(
            combo_product_id,
            &combo.sku,
            combo_counters(combo_record.as_ref()),
            &component_states,
            &packaging,
            quantity,
        )?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Combo { combo_product_id },
            quantity,
            None,
            note,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%combo_product_id, %warehouse_id, quantity, "combo disassembled");
        Ok(id)
    }

    /// Ship an assembled combo. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientStock`] if less than `quantity` of
    /// the combo is finished.
    pub async fn ship_combo(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
    ) -> Result<TransactionId, EngineError> {
        self.ship_combo_with_batch(combo_product_id, warehouse_id, quantity, note, None)
            .await
    }

    /// Ship a combo, optionally stamping a batch id on the log row.
    #[tracing::instrument(skip(self, note))]
    pub(crate) async fn ship_combo_with_batch(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
        quantity: i32,
        note: Option<String>,
        batch_id: Option<Uuid>,
    ) -> Result<TransactionId, EngineError> {
        let mut tx = self.begin().await?;
        let combo = load_combo(&mut tx, combo_product_id).await?;
        ensure_warehouse(&mut tx, warehouse_id).await?;

        let combo_record = stock::lock_combo_stock_record(&mut tx, combo_product_id, warehouse_id)
            .await
            .map_err(lock_error)?;
        let transition_plan = plan::plan_ship_combo(
            combo_product_id,
            &combo.sku,
            combo_counters(combo_record.as_ref()),
            quantity,
        )?;

        let id = apply_and_log(
            &mut tx,
            warehouse_id,
            &transition_plan,
            TransactionItem::Combo { combo_product_id },
            quantity,
            batch_id,
            note,
        )
        .await?;
        Self::commit(tx).await?;

        tracing::info!(%combo_product_id, %warehouse_id, quantity, "combo shipped");
        Ok(id)
    }

    // =========================================================================
    // Availability (advisory, read-only)
    // =========================================================================

    /// Maximum packageable quantity with the current (unlocked) ledger state.
    ///
    /// Advisory only: the transition re-validates under lock, so the answer
    /// can shrink between display and execution but never the other way.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_package(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.product_or_unknown(product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;

        let requirements = catalog::packaging_for_product(&self.pool, product_id)
            .await
            .map_err(lock_error)?;
        let semi_finished = stock::get_stock(&self.pool, product_id, warehouse_id)
            .await
            .map_err(lock_error)?
            .map_or(0, |s| s.semi_finished);
        let lines = self.packaging_lines(&requirements, warehouse_id).await?;

        Ok(availability::max_package(semi_finished, &lines))
    }

    /// Maximum receivable quantity. Unconstrained by stock; existence of the
    /// references is still validated.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_receive(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.product_or_unknown(product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;
        Ok(availability::max_receive())
    }

    /// Maximum unpackable quantity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_unpack(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.product_or_unknown(product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;
        let finished = stock::get_stock(&self.pool, product_id, warehouse_id)
            .await
            .map_err(lock_error)?
            .map_or(0, |s| s.finished);
        Ok(availability::max_unpack(finished))
    }

    /// Maximum shippable quantity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_ship(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.product_or_unknown(product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;
        let finished = stock::get_stock(&self.pool, product_id, warehouse_id)
            .await
            .map_err(lock_error)?
            .map_or(0, |s| s.finished);
        Ok(availability::max_ship(finished))
    }

    /// Maximum assemblable quantity for a combo, with the limiting component
    /// or packaging material named for display.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_assemble(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.combo_or_unknown(combo_product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;

        let components = catalog::components_for_combo(&self.pool, combo_product_id)
            .await
            .map_err(lock_error)?;
        let requirements = catalog::packaging_for_combo(&self.pool, combo_product_id)
            .await
            .map_err(lock_error)?;

        let mut component_lines = Vec::with_capacity(components.len());
        for component in &components {
            let semi_finished = stock::get_stock(&self.pool, component.product_id, warehouse_id)
                .await
                .map_err(lock_error)?
                .map_or(0, |s| s.semi_finished);
            component_lines.push(ResourceLine {
                sku: component.sku.clone(),
                per_unit: component.quantity,
                available: semi_finished,
            });
        }
        let packaging_lines = self.packaging_lines(&requirements, warehouse_id).await?;

        Ok(availability::max_assemble(&component_lines, &packaging_lines))
    }

    /// Maximum disassemblable quantity for a combo.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_disassemble(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.combo_or_unknown(combo_product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;
        let finished = stock::get_combo_stock(&self.pool, combo_product_id, warehouse_id)
            .await
            .map_err(lock_error)?
            .map_or(0, |s| s.finished);
        Ok(availability::max_disassemble(finished))
    }

    /// Maximum shippable quantity for a combo.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItemOrWarehouse`] or a repository error.
    pub async fn max_ship_combo(
        &self,
        combo_product_id: ComboProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Availability, EngineError> {
        self.combo_or_unknown(combo_product_id).await?;
        self.warehouse_or_unknown(warehouse_id).await?;
        let finished = stock::get_combo_stock(&self.pool, combo_product_id, warehouse_id)
            .await
            .map_err(lock_error)?
            .map_or(0, |s| s.finished);
        Ok(availability::max_ship_combo(finished))
    }

    // =========================================================================
    // Lookup helpers
    // =========================================================================

    async fn product_or_unknown(&self, product_id: ProductId) -> Result<Product, EngineError> {
        catalog::get_product(&self.pool, product_id)
            .await
            .map_err(lock_error)?
            .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
                detail: format!("product {product_id} does not exist"),
            })
    }

    async fn combo_or_unknown(
        &self,
        combo_product_id: ComboProductId,
    ) -> Result<ComboProduct, EngineError> {
        catalog::get_combo_product(&self.pool, combo_product_id)
            .await
            .map_err(lock_error)?
            .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
                detail: format!("combo product {combo_product_id} does not exist"),
            })
    }

    async fn warehouse_or_unknown(&self, warehouse_id: WarehouseId) -> Result<(), EngineError> {
        catalog::get_warehouse(&self.pool, warehouse_id)
            .await
            .map_err(lock_error)?
            .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
                detail: format!("warehouse {warehouse_id} does not exist"),
            })?;
        Ok(())
    }

    async fn packaging_lines(
        &self,
        requirements: &[PackagingRequirement],
        warehouse_id: WarehouseId,
    ) -> Result<Vec<ResourceLine>, EngineError> {
        let mut lines = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let finished = stock::get_stock(&self.pool, requirement.packaging_id, warehouse_id)
                .await
                .map_err(lock_error)?
                .map_or(0, |s| s.finished);
            lines.push(ResourceLine {
                sku: requirement.sku.clone(),
                per_unit: requirement.quantity,
                available: finished,
            });
        }
        Ok(lines)
    }

    /// The pool this engine runs against. Used by the batch coordinator.
    pub(crate) const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

async fn load_product(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Product, EngineError> {
    catalog::get_product(&mut *conn, product_id)
        .await
        .map_err(lock_error)?
        .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
            detail: format!("product {product_id} does not exist"),
        })
}

async fn load_combo(
    conn: &mut PgConnection,
    combo_product_id: ComboProductId,
) -> Result<ComboProduct, EngineError> {
    catalog::get_combo_product(&mut *conn, combo_product_id)
        .await
        .map_err(lock_error)?
        .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
            detail: format!("combo product {combo_product_id} does not exist"),
        })
}

async fn ensure_warehouse(
    conn: &mut PgConnection,
    warehouse_id: WarehouseId,
) -> Result<(), EngineError> {
    catalog::get_warehouse(&mut *conn, warehouse_id)
        .await
        .map_err(lock_error)?
        .ok_or_else(|| EngineError::UnknownItemOrWarehouse {
            detail: format!("warehouse {warehouse_id} does not exist"),
        })?;
    Ok(())
}

/// Lock the stock rows for a target product plus any auxiliary products.
async fn lock_base_rows(
    conn: &mut PgConnection,
    warehouse_id: WarehouseId,
    target: ProductId,
    auxiliary: impl Iterator<Item = ProductId>,
) -> Result<HashMap<ProductId, StockRecord>, EngineError> {
    lock_rows(conn, warehouse_id, std::iter::once(target).chain(auxiliary)).await
}

/// Lock a set of stock rows in ascending product-id order.
///
/// Pairs without a persisted record are absent from the map; callers treat
/// them as zeroed, which makes the subsequent precondition check fail with
/// the right shortfall instead of a missing-row error.
async fn lock_rows(
    conn: &mut PgConnection,
    warehouse_id: WarehouseId,
    product_ids: impl Iterator<Item = ProductId>,
) -> Result<HashMap<ProductId, StockRecord>, EngineError> {
    let mut ids: Vec<ProductId> = product_ids.collect();
    ids.sort_unstable();
    ids.dedup();

    let records = stock::lock_stock_records(conn, warehouse_id, &ids)
        .await
        .map_err(lock_error)?;
    Ok(records.into_iter().map(|r| (r.product_id, r)).collect())
}

fn item_state(product: &Product, record: &StockRecord) -> ItemState {
    ItemState {
        product_id: product.id,
        sku: product.sku.clone(),
        counters: BaseCounters {
            in_transit: record.in_transit,
            semi_finished: record.semi_finished,
            finished: record.finished,
            shipped: record.shipped,
        },
    }
}

fn counters_of(record: Option<&StockRecord>) -> BaseCounters {
    record.map_or_else(BaseCounters::default, |r| BaseCounters {
        in_transit: r.in_transit,
        semi_finished: r.semi_finished,
        finished: r.finished,
        shipped: r.shipped,
    })
}

fn combo_counters(record: Option<&crate::models::stock::ComboStockRecord>) -> ComboCounters {
    record.map_or_else(ComboCounters::default, |r| ComboCounters {
        finished: r.finished,
        shipped: r.shipped,
    })
}

fn requirement_states(
    requirements: &[PackagingRequirement],
    locked: &HashMap<ProductId, StockRecord>,
) -> Vec<RequirementState> {
    requirements
        .iter()
        .map(|r| RequirementState {
            packaging_id: r.packaging_id,
            sku: r.sku.clone(),
            per_unit: r.quantity,
            finished: locked.get(&r.packaging_id).map_or(0, |s| s.finished),
        })
        .collect()
}

fn component_states(
    components: &[crate::models::catalog::ComboComponent],
    locked: &HashMap<ProductId, StockRecord>,
) -> Vec<ComponentState> {
    components
        .iter()
        .map(|c| ComponentState {
            product_id: c.product_id,
            sku: c.sku.clone(),
            per_unit: c.quantity,
            semi_finished: locked.get(&c.product_id).map_or(0, |s| s.semi_finished),
        })
        .collect()
}

/// Apply a validated plan's deltas and append its transaction-log row.
async fn apply_and_log(
    conn: &mut PgConnection,
    warehouse_id: WarehouseId,
    transition_plan: &TransitionPlan,
    item: TransactionItem,
    quantity: i32,
    batch_id: Option<Uuid>,
    note: Option<String>,
) -> Result<TransactionId, EngineError> {
    for delta in &transition_plan.deltas {
        match *delta {
            plan::CounterDelta::Base {
                product_id,
                bucket,
                delta,
            } => stock::apply_stock_delta(conn, product_id, warehouse_id, bucket, delta)
                .await
                .map_err(lock_error)?,
            plan::CounterDelta::Combo {
                combo_product_id,
                bucket,
                delta,
            } => stock::apply_combo_stock_delta(conn, combo_product_id, warehouse_id, bucket, delta)
                .await
                .map_err(lock_error)?,
        }
    }

    transactions::insert_transaction(
        conn,
        &NewTransaction {
            item,
            warehouse_id,
            transition: transition_plan.transition,
            from_bucket: transition_plan.from_bucket,
            to_bucket: transition_plan.to_bucket,
            quantity,
            batch_id,
            note,
        },
    )
    .await
    .map_err(lock_error)
}
