//! Product, variant and inventory read operations for the Admin API.

use reward_sync_core::{InventoryItemId, ProductId, VariantId};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use super::{
    AdminClient, AdminShopifyError,
    collections::convert_collection,
    parse_decimal,
    queries::{self, GetInventoryItemCost, GetProductCollections, GetProductVariants},
};
use crate::shopify::types::{Collection, VariantPricing};

/// Parse a money amount, treating a malformed value as zero.
fn amount_or_zero(field: &str, variant_gid: &str, value: &str) -> Decimal {
    parse_decimal(field, value).unwrap_or_else(|e| {
        warn!(variant = variant_gid, error = %e, "Malformed amount, using zero");
        Decimal::ZERO
    })
}

fn convert_variant(
    v: queries::get_product_variants::Variant,
) -> Result<VariantPricing, AdminShopifyError> {
    let price = v
        .price
        .as_deref()
        .map_or(Decimal::ZERO, |price| amount_or_zero("price", &v.id, price));

    let (inventory_item_id, unit_cost) = match v.inventory_item {
        Some(item) => {
            let cost = item
                .unit_cost
                .map(|c| amount_or_zero("unitCost", &v.id, &c.amount));
            (Some(InventoryItemId::from_gid(&item.id)?), cost)
        }
        None => (None, None),
    };

    Ok(VariantPricing {
        id: VariantId::from_gid(&v.id)?,
        title: v.title,
        price,
        inventory_item_id,
        unit_cost,
    })
}

impl AdminClient {
    /// Get price and unit cost for the first `first` variants of a product.
    ///
    /// An unknown product yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or a value is malformed.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_variants(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<VariantPricing>, AdminShopifyError> {
        let variables = queries::get_product_variants::Variables {
            id: product_id.gid(),
            first,
        };

        let response = self.execute::<GetProductVariants>(variables).await?;

        response.product.map_or_else(
            || Ok(Vec::new()),
            |p| p.variants.nodes.into_iter().map(convert_variant).collect(),
        )
    }

    /// Get the collections a product belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or an ID is malformed.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_collections(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<Collection>, AdminShopifyError> {
        let variables = queries::get_product_collections::Variables {
            id: product_id.gid(),
            first,
        };

        let response = self.execute::<GetProductCollections>(variables).await?;

        response.product.map_or_else(
            || Ok(Vec::new()),
            |p| p.collections.nodes.into_iter().map(convert_collection).collect(),
        )
    }

    /// Get the unit cost recorded on an inventory item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the cost is malformed.
    #[instrument(skip(self), fields(inventory_item_id = %inventory_item_id))]
    pub async fn get_inventory_item_unit_cost(
        &self,
        inventory_item_id: InventoryItemId,
    ) -> Result<Option<Decimal>, AdminShopifyError> {
        let variables = queries::get_inventory_item_cost::Variables {
            id: inventory_item_id.gid(),
        };

        let response = self.execute::<GetInventoryItemCost>(variables).await?;

        response
            .inventory_item
            .and_then(|item| item.unit_cost)
            .map(|cost| parse_decimal("unitCost", &cost.amount))
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::super::tests::mock_graphql;
    use crate::shopify::ShopifyAdmin;

    use super::*;

    #[tokio::test]
    async fn test_get_product_variants() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "product": {
                    "id": "gid://shopify/Product/101",
                    "variants": {
                        "nodes": [
                            {
                                "id": "gid://shopify/ProductVariant/1001",
                                "title": "Small",
                                "price": "100.00",
                                "inventoryItem": {
                                    "id": "gid://shopify/InventoryItem/5001",
                                    "unitCost": { "amount": "60.0" }
                                }
                            },
                            {
                                "id": "gid://shopify/ProductVariant/1002",
                                "title": "Large",
                                "price": "120.00",
                                "inventoryItem": {
                                    "id": "gid://shopify/InventoryItem/5002",
                                    "unitCost": null
                                }
                            }
                        ]
                    }
                }
            }
        }))
        .await;

        let variants = client
            .product_variants(ProductId::new(101), 250)
            .await
            .unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].id, VariantId::new(1001));
        assert_eq!(variants[0].price, dec!(100.00));
        assert_eq!(variants[0].unit_cost, Some(dec!(60.0)));
        assert_eq!(variants[1].unit_cost, None);
        assert_eq!(variants[1].cost_or_zero(), Decimal::ZERO);
        assert_eq!(
            variants[1].inventory_item_id,
            Some(InventoryItemId::new(5002))
        );
    }

    #[tokio::test]
    async fn test_malformed_amounts_count_as_zero() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "product": {
                    "id": "gid://shopify/Product/101",
                    "variants": {
                        "nodes": [
                            {
                                "id": "gid://shopify/ProductVariant/1001",
                                "title": "Small",
                                "price": "abc",
                                "inventoryItem": {
                                    "id": "gid://shopify/InventoryItem/5001",
                                    "unitCost": { "amount": "60.0" }
                                }
                            },
                            {
                                "id": "gid://shopify/ProductVariant/1002",
                                "title": "Large",
                                "price": "120.00",
                                "inventoryItem": {
                                    "id": "gid://shopify/InventoryItem/5002",
                                    "unitCost": { "amount": "n/a" }
                                }
                            }
                        ]
                    }
                }
            }
        }))
        .await;

        let variants = client
            .product_variants(ProductId::new(101), 250)
            .await
            .unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].price, Decimal::ZERO);
        assert_eq!(variants[0].unit_cost, Some(dec!(60.0)));
        assert_eq!(variants[1].price, dec!(120.00));
        assert_eq!(variants[1].unit_cost, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_unknown_product_has_no_variants() {
        let (_server, client) =
            mock_graphql(serde_json::json!({ "data": { "product": null } })).await;

        let variants = client.product_variants(ProductId::new(1), 250).await.unwrap();
        assert!(variants.is_empty());
    }

    #[tokio::test]
    async fn test_get_product_collections() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "product": {
                    "id": "gid://shopify/Product/101",
                    "collections": {
                        "nodes": [{ "id": "gid://shopify/Collection/11", "title": "Shoes", "handle": "shoes" }]
                    }
                }
            }
        }))
        .await;

        let collections = client
            .product_collections(ProductId::new(101), 10)
            .await
            .unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].title, "Shoes");
    }

    #[tokio::test]
    async fn test_get_inventory_item_unit_cost() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "inventoryItem": {
                    "id": "gid://shopify/InventoryItem/5001",
                    "unitCost": { "amount": "12.5" }
                }
            }
        }))
        .await;

        let cost = client
            .inventory_item_unit_cost(InventoryItemId::new(5001))
            .await
            .unwrap();
        assert_eq!(cost, Some(dec!(12.5)));
    }
}
