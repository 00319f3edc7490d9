//! Category domain types.

use chrono::{DateTime, Utc};
use reward_sync_core::{CategoryId, CollectionId, GrossMargins, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::product::ProductWithVariants;

/// A merchant-defined category with its gross-margin percentages.
///
/// Paired with at most one Shopify collection by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Database ID.
    pub id: CategoryId,
    /// Unique display name, matched case-insensitively against collection titles.
    pub name: String,
    /// Share of the variant margin (percent) paid to elite customers.
    pub elite_gross_margin: Decimal,
    /// Share of the variant margin (percent) paid to regular customers.
    pub regular_gross_margin: Decimal,
    /// Matching Shopify collection, once one has been found.
    pub collection_id: Option<CollectionId>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// The category's margins as calculator input.
    #[must_use]
    pub const fn margins(&self) -> GrossMargins {
        GrossMargins::new(self.elite_gross_margin, self.regular_gross_margin)
    }
}

/// Validated fields for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Gross-margin percentages.
    pub margins: GrossMargins,
}

/// A category with every stored product and variant that belongs to it.
#[derive(Debug, Clone)]
pub struct CategoryWithProducts {
    /// The category.
    pub category: Category,
    /// Products in the category's collection.
    pub products: Vec<ProductWithVariants>,
}

impl CategoryWithProducts {
    /// Every stored variant, with its product ID.
    pub fn variant_ids(&self) -> impl Iterator<Item = (ProductId, VariantId)> + '_ {
        self.products
            .iter()
            .flat_map(|p| p.variants.iter().map(move |v| (p.product.id, v.id)))
    }
}
