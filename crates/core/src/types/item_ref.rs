//! Discriminated reference to either a base product or a combo product.

use serde::{Deserialize, Serialize};

use crate::types::id::{ComboProductId, ProductId};

/// Reference to the item a shipment line (or transaction) targets.
///
/// Exactly one of the two variants applies; the JSON form carries either a
/// `product_id` or a `combo_product_id` field, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    /// A base product tracked through all four stock buckets.
    Base {
        /// Base product identifier.
        product_id: ProductId,
    },
    /// A combo product assembled from base items.
    Combo {
        /// Combo product identifier.
        combo_product_id: ComboProductId,
    },
}

impl ItemRef {
    /// Reference a base product.
    #[must_use]
    pub const fn base(product_id: ProductId) -> Self {
        Self::Base { product_id }
    }

    /// Reference a combo product.
    #[must_use]
    pub const fn combo(combo_product_id: ComboProductId) -> Self {
        Self::Combo { combo_product_id }
    }
}

impl core::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Base { product_id } => write!(f, "product {product_id}"),
            Self::Combo { combo_product_id } => write!(f, "combo {combo_product_id}"),
        }
    }
}
