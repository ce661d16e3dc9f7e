//! Catalog models: products, packaging materials, warehouses, combos.
//!
//! The catalog is reference data for the engine. It has no mutating HTTP
//! surface here; the seed CLI is the only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use packhouse_core::{ComboProductId, ProductId, WarehouseId};

/// Whether a catalog entry is a sellable product or a packaging material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A sellable base item.
    Product,
    /// Auxiliary material consumed when items are packaged or assembled.
    Packaging,
}

impl core::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "packaging" => Ok(Self::Packaging),
            other => Err(format!("unknown product kind: {other}")),
        }
    }
}

/// A base item or packaging material in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Stock keeping unit, unique.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Product vs packaging discriminator.
    pub kind: ProductKind,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// A warehouse location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    /// Unique warehouse ID.
    pub id: WarehouseId,
    /// Display name, unique.
    pub name: String,
    /// When the warehouse was created.
    pub created_at: DateTime<Utc>,
}

/// A composite product assembled from base items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboProduct {
    /// Unique combo product ID.
    pub id: ComboProductId,
    /// Stock keeping unit, unique.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// When the combo was created.
    pub created_at: DateTime<Utc>,
}

/// One line of a combo's bill of materials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboComponent {
    /// The combo this component belongs to.
    pub combo_product_id: ComboProductId,
    /// The base product consumed when assembling.
    pub product_id: ProductId,
    /// Base product SKU, for diagnostics.
    pub sku: String,
    /// Units of the base product per assembled combo.
    pub quantity: i32,
}

/// A packaging requirement for a base item or a combo.
///
/// Multiple rows per owner are allowed; declaration order (row id) decides
/// limiting-factor tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingRequirement {
    /// The packaging material consumed.
    pub packaging_id: ProductId,
    /// Packaging SKU, for diagnostics.
    pub sku: String,
    /// Units of packaging per unit of the owning item.
    pub quantity: i32,
}
