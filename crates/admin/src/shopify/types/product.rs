//! Product and variant domain types for Shopify Admin API.

use reward_sync_core::{InventoryItemId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing data for a single product variant.
///
/// Only the fields needed to compute rewards are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPricing {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Current sale price.
    pub price: Decimal,
    /// Inventory item backing the variant.
    pub inventory_item_id: Option<InventoryItemId>,
    /// Unit cost recorded on the inventory item, if the merchant set one.
    pub unit_cost: Option<Decimal>,
}

impl VariantPricing {
    /// Unit cost, with a missing cost counted as zero.
    #[must_use]
    pub fn cost_or_zero(&self) -> Decimal {
        self.unit_cost.unwrap_or(Decimal::ZERO)
    }
}
