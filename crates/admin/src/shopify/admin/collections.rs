//! Collection read operations for the Admin API.

use reward_sync_core::{CollectionId, ProductId};
use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError,
    queries::{self, CollectionNode, GetCollectionProducts, GetCollections},
};
use crate::shopify::types::{Collection, CollectionProduct, CollectionWithProducts};

/// Convert a collection node from any listing into a domain collection.
pub(super) fn convert_collection(node: CollectionNode) -> Result<Collection, AdminShopifyError> {
    Ok(Collection {
        id: CollectionId::from_gid(&node.id)?,
        title: node.title,
        handle: node.handle,
    })
}

impl AdminClient {
    /// List the first `first` collections in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or an ID is malformed.
    #[instrument(skip(self))]
    pub async fn get_collections(&self, first: i64) -> Result<Vec<Collection>, AdminShopifyError> {
        let variables = queries::get_collections::Variables { first };

        let response = self.execute::<GetCollections>(variables).await?;

        response
            .collections
            .nodes
            .into_iter()
            .map(convert_collection)
            .collect()
    }

    /// Get a collection with the first `first` of its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or an ID is malformed.
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    pub async fn get_collection_products(
        &self,
        collection_id: CollectionId,
        first: i64,
    ) -> Result<Option<CollectionWithProducts>, AdminShopifyError> {
        let variables = queries::get_collection_products::Variables {
            id: collection_id.gid(),
            first,
        };

        let response = self.execute::<GetCollectionProducts>(variables).await?;

        let Some(c) = response.collection else {
            return Ok(None);
        };

        let products = c
            .products
            .nodes
            .into_iter()
            .map(|p| {
                Ok(CollectionProduct {
                    id: ProductId::from_gid(&p.id)?,
                    title: p.title,
                    handle: p.handle,
                })
            })
            .collect::<Result<Vec<_>, AdminShopifyError>>()?;

        Ok(Some(CollectionWithProducts {
            collection: Collection {
                id: CollectionId::from_gid(&c.id)?,
                title: c.title,
                handle: c.handle,
            },
            products,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::mock_graphql;
    use crate::shopify::ShopifyAdmin;

    use super::*;

    #[tokio::test]
    async fn test_get_collections() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "collections": {
                    "nodes": [
                        { "id": "gid://shopify/Collection/11", "title": "Shoes", "handle": "shoes" },
                        { "id": "gid://shopify/Collection/12", "title": "Hats", "handle": "hats" }
                    ]
                }
            }
        }))
        .await;

        let collections = client.collections(250).await.unwrap();
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[1].id, CollectionId::new(12));
        assert_eq!(collections[1].title, "Hats");
    }

    #[tokio::test]
    async fn test_get_collections_rejects_foreign_gid() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "collections": {
                    "nodes": [{ "id": "gid://shopify/Product/11", "title": "Shoes", "handle": "shoes" }]
                }
            }
        }))
        .await;

        let err = client.collections(250).await.unwrap_err();
        assert!(matches!(err, AdminShopifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_get_collection_products() {
        let (_server, client) = mock_graphql(serde_json::json!({
            "data": {
                "collection": {
                    "id": "gid://shopify/Collection/11",
                    "title": "Shoes",
                    "handle": "shoes",
                    "products": {
                        "nodes": [
                            { "id": "gid://shopify/Product/101", "title": "Runner", "handle": "runner" }
                        ]
                    }
                }
            }
        }))
        .await;

        let found = client
            .collection_products(CollectionId::new(11), 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.collection.title, "Shoes");
        assert_eq!(found.products[0].id, ProductId::new(101));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_none() {
        let (_server, client) =
            mock_graphql(serde_json::json!({ "data": { "collection": null } })).await;

        let found = client
            .collection_products(CollectionId::new(99), 100)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
