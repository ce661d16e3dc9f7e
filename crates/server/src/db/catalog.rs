//! Read-only catalog queries: products, warehouses, combos, requirements.
//!
//! Requirement and component listings are ordered by row id, which is the
//! declaration order used for limiting-factor tie-breaks.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use packhouse_core::{ComboProductId, ProductId, WarehouseId};

use super::RepositoryError;
use crate::models::catalog::{
    ComboComponent, ComboProduct, PackagingRequirement, Product, ProductKind, Warehouse,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    sku: String,
    name: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<ProductKind>()
            .map_err(RepositoryError::DataCorruption)?;
        Ok(Self {
            id: ProductId::new(row.id),
            sku: row.sku,
            name: row.name,
            kind,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for warehouse queries.
#[derive(Debug, sqlx::FromRow)]
struct WarehouseRow {
    id: i32,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Self {
            id: WarehouseId::new(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for combo product queries.
#[derive(Debug, sqlx::FromRow)]
struct ComboProductRow {
    id: i32,
    sku: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ComboProductRow> for ComboProduct {
    fn from(row: ComboProductRow) -> Self {
        Self {
            id: ComboProductId::new(row.id),
            sku: row.sku,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for combo component queries (joined with product SKU).
#[derive(Debug, sqlx::FromRow)]
struct ComboComponentRow {
    combo_product_id: i32,
    product_id: i32,
    sku: String,
    quantity: i32,
}

impl From<ComboComponentRow> for ComboComponent {
    fn from(row: ComboComponentRow) -> Self {
        Self {
            combo_product_id: ComboProductId::new(row.combo_product_id),
            product_id: ProductId::new(row.product_id),
            sku: row.sku,
            quantity: row.quantity,
        }
    }
}

/// Internal row type for packaging requirement queries (joined with SKU).
#[derive(Debug, sqlx::FromRow)]
struct PackagingRequirementRow {
    packaging_id: i32,
    sku: String,
    quantity: i32,
}

impl From<PackagingRequirementRow> for PackagingRequirement {
    fn from(row: PackagingRequirementRow) -> Self {
        Self {
            packaging_id: ProductId::new(row.packaging_id),
            sku: row.sku,
            quantity: row.quantity,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Get a product by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, or
/// `RepositoryError::DataCorruption` if the stored kind is unknown.
pub async fn get_product(
    executor: impl PgExecutor<'_>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, sku, name, kind, created_at
        FROM product
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Get a warehouse by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_warehouse(
    executor: impl PgExecutor<'_>,
    id: WarehouseId,
) -> Result<Option<Warehouse>, RepositoryError> {
    let row = sqlx::query_as::<_, WarehouseRow>(
        r"
        SELECT id, name, created_at
        FROM warehouse
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Get a combo product by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_combo_product(
    executor: impl PgExecutor<'_>,
    id: ComboProductId,
) -> Result<Option<ComboProduct>, RepositoryError> {
    let row = sqlx::query_as::<_, ComboProductRow>(
        r"
        SELECT id, sku, name, created_at
        FROM combo_product
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// List a combo's components in declaration order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn components_for_combo(
    executor: impl PgExecutor<'_>,
    combo_product_id: ComboProductId,
) -> Result<Vec<ComboComponent>, RepositoryError> {
    let rows = sqlx::query_as::<_, ComboComponentRow>(
        r"
        SELECT cc.combo_product_id, cc.product_id, p.sku, cc.quantity
        FROM combo_component cc
        JOIN product p ON p.id = cc.product_id
        WHERE cc.combo_product_id = $1
        ORDER BY cc.id
        ",
    )
    .bind(combo_product_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// List a base product's packaging requirements in declaration order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn packaging_for_product(
    executor: impl PgExecutor<'_>,
    product_id: ProductId,
) -> Result<Vec<PackagingRequirement>, RepositoryError> {
    let rows = sqlx::query_as::<_, PackagingRequirementRow>(
        r"
        SELECT pr.packaging_id, p.sku, pr.quantity
        FROM packaging_requirement pr
        JOIN product p ON p.id = pr.packaging_id
        WHERE pr.product_id = $1
        ORDER BY pr.id
        ",
    )
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// List a combo's own packaging requirements in declaration order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn packaging_for_combo(
    executor: impl PgExecutor<'_>,
    combo_product_id: ComboProductId,
) -> Result<Vec<PackagingRequirement>, RepositoryError> {
    let rows = sqlx::query_as::<_, PackagingRequirementRow>(
        r"
        SELECT cpr.packaging_id, p.sku, cpr.quantity
        FROM combo_packaging_requirement cpr
        JOIN product p ON p.id = cpr.packaging_id
        WHERE cpr.combo_product_id = $1
        ORDER BY cpr.id
        ",
    )
    .bind(combo_product_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
