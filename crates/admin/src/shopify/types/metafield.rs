//! Reward metafield types.

use reward_sync_core::{ProductId, RewardAmounts, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metafield namespace holding reward values.
pub const REWARDS_NAMESPACE: &str = "rewards";

/// Metafield key for the elite reward.
pub const ELITE_REWARD_KEY: &str = "elite_reward";

/// Metafield key for the regular reward.
pub const REGULAR_REWARD_KEY: &str = "regular_reward";

/// Metafield type used for both reward values.
pub const REWARD_METAFIELD_TYPE: &str = "number_decimal";

/// A metafield in the `rewards` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardMetafield {
    /// Metafield key (`elite_reward`, `regular_reward`, or anything else
    /// stored in the namespace).
    pub key: String,
    /// Raw metafield value.
    pub value: String,
}

/// The reward metafields of a variant, as read back from Shopify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRewardMetafields {
    /// Variant ID.
    pub variant_id: VariantId,
    /// Product the variant belongs to.
    pub product_id: ProductId,
    /// Metafields in the `rewards` namespace.
    pub metafields: Vec<RewardMetafield>,
}

impl VariantRewardMetafields {
    /// Sum the numeric reward metafields.
    ///
    /// Values that do not parse as decimals are ignored, and a missing
    /// metafield counts as zero.
    #[must_use]
    pub fn rewards(&self) -> RewardAmounts {
        let mut rewards = RewardAmounts::ZERO;
        for field in &self.metafields {
            let Ok(value) = field.value.trim().parse::<Decimal>() else {
                continue;
            };
            match field.key.as_str() {
                ELITE_REWARD_KEY => rewards.elite += value,
                REGULAR_REWARD_KEY => rewards.regular += value,
                _ => {}
            }
        }
        rewards
    }
}
