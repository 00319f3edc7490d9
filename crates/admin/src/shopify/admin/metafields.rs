//! Reward metafield operations for the Admin API.

use reward_sync_core::{ProductId, RewardAmounts, VariantId};
use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError,
    queries::{self, GetVariantRewardMetafields, ProductVariantsBulkUpdate},
};
use crate::shopify::types::{
    ELITE_REWARD_KEY, REGULAR_REWARD_KEY, REWARD_METAFIELD_TYPE, REWARDS_NAMESPACE,
    RewardMetafield, VariantRewardMetafields,
};

/// Number of metafields read from the `rewards` namespace.
const METAFIELDS_PAGE: i64 = 10;

fn reward_metafield_input(
    key: &str,
    value: String,
) -> queries::product_variants_bulk_update::MetafieldInput {
    queries::product_variants_bulk_update::MetafieldInput {
        namespace: REWARDS_NAMESPACE.to_string(),
        key: key.to_string(),
        type_: REWARD_METAFIELD_TYPE.to_string(),
        value,
    }
}

impl AdminClient {
    /// Get the `rewards` metafields of a variant and the ID of its product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or an ID is malformed.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn get_variant_reward_metafields(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantRewardMetafields>, AdminShopifyError> {
        let variables = queries::get_variant_reward_metafields::Variables {
            id: variant_id.gid(),
            namespace: REWARDS_NAMESPACE.to_string(),
            first: METAFIELDS_PAGE,
        };

        let response = self.execute::<GetVariantRewardMetafields>(variables).await?;

        let Some(v) = response.product_variant else {
            return Ok(None);
        };

        Ok(Some(VariantRewardMetafields {
            variant_id: VariantId::from_gid(&v.id)?,
            product_id: ProductId::from_gid(&v.product.id)?,
            metafields: v
                .metafields
                .nodes
                .into_iter()
                .map(|m| RewardMetafield {
                    key: m.key,
                    value: m.value,
                })
                .collect(),
        }))
    }

    /// Write the elite and regular reward metafields onto a variant.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` if Shopify rejects the input,
    /// or another error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, variant_id = %variant_id))]
    pub async fn update_variant_rewards(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        rewards: RewardAmounts,
    ) -> Result<(), AdminShopifyError> {
        let variables = queries::product_variants_bulk_update::Variables {
            product_id: product_id.gid(),
            variants: vec![queries::product_variants_bulk_update::ProductVariantsBulkInput {
                id: variant_id.gid(),
                metafields: vec![
                    reward_metafield_input(ELITE_REWARD_KEY, rewards.elite_metafield_value()),
                    reward_metafield_input(REGULAR_REWARD_KEY, rewards.regular_metafield_value()),
                ],
            }],
        };

        let response = self.execute::<ProductVariantsBulkUpdate>(variables).await?;

        if let Some(payload) = response.product_variants_bulk_update
            && !payload.user_errors.is_empty()
        {
            let messages: Vec<String> = payload
                .user_errors
                .iter()
                .map(|e| match &e.field {
                    Some(field) => format!("{}: {}", field.join("."), e.message),
                    None => e.message.clone(),
                })
                .collect();
            return Err(AdminShopifyError::UserError(messages.join("; ")));
        }

        Ok(())
    }
}
