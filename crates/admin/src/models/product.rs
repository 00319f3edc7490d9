//! Product and variant domain types.

use reward_sync_core::{CollectionId, ProductId, RewardAmounts, VariantId};
use rust_decimal::Decimal;
use serde::Serialize;

/// A Shopify product mirrored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Shopify product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Collection the product was synced from.
    pub collection_id: Option<CollectionId>,
}

/// A Shopify variant with its computed rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// Shopify variant ID.
    pub id: VariantId,
    /// Owning product.
    pub product_id: ProductId,
    /// Sale price at last sync.
    pub price: Decimal,
    /// Unit cost at last sync (zero when Shopify had none).
    pub unit_cost: Decimal,
    /// Reward for elite customers.
    pub elite_reward: Decimal,
    /// Reward for regular customers.
    pub regular_reward: Decimal,
}

impl Variant {
    /// Build a variant row from pricing and computed rewards.
    #[must_use]
    pub const fn new(
        id: VariantId,
        product_id: ProductId,
        price: Decimal,
        unit_cost: Decimal,
        rewards: RewardAmounts,
    ) -> Self {
        Self {
            id,
            product_id,
            price,
            unit_cost,
            elite_reward: rewards.elite,
            regular_reward: rewards.regular,
        }
    }

    /// The stored rewards.
    #[must_use]
    pub const fn rewards(&self) -> RewardAmounts {
        RewardAmounts::new(self.elite_reward, self.regular_reward)
    }
}

/// A product together with its stored variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithVariants {
    /// The product.
    pub product: Product,
    /// Its variants.
    pub variants: Vec<Variant>,
}
