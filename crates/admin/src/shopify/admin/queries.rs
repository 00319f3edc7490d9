//! GraphQL query definitions for Shopify Admin API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` over the
//! documents in `graphql/admin/`. Several operations share one document; the
//! operation name selects which one Shopify runs.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// Custom scalar type aliases
// =============================================================================

/// Decimal number as string (preserves precision).
type Decimal = String;

/// Money amount as decimal string.
type Money = String;

const COLLECTIONS_DOCUMENT: &str = include_str!("../../../graphql/admin/collections.graphql");
const PRODUCTS_DOCUMENT: &str = include_str!("../../../graphql/admin/products.graphql");
const METAFIELDS_DOCUMENT: &str = include_str!("../../../graphql/admin/metafields.graphql");

/// Implement `GraphQLQuery` for an operation whose `Variables` and
/// `ResponseData` live in the given module.
macro_rules! graphql_operation {
    ($name:ident, $module:ident, $document:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

/// A `{ nodes: [...] }` connection page.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

/// Fields shared by every collection listing.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CollectionNode {
    pub id: String,
    pub title: String,
    pub handle: String,
}

/// `MoneyV2` reduced to its amount.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct MoneyAmount {
    pub amount: Decimal,
}

// =============================================================================
// Collection queries
// =============================================================================

graphql_operation!(GetCollections, get_collections, COLLECTIONS_DOCUMENT);

pub mod get_collections {
    use serde::{Deserialize, Serialize};

    use super::{CollectionNode, Nodes};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Nodes<CollectionNode>,
    }
}

graphql_operation!(GetCollectionProducts, get_collection_products, COLLECTIONS_DOCUMENT);

pub mod get_collection_products {
    use serde::{Deserialize, Serialize};

    use super::Nodes;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<Collection>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Collection {
        pub id: String,
        pub title: String,
        pub handle: String,
        pub products: Nodes<Product>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub id: String,
        pub title: String,
        pub handle: String,
    }
}

// =============================================================================
// Product queries
// =============================================================================

graphql_operation!(GetProductVariants, get_product_variants, PRODUCTS_DOCUMENT);

pub mod get_product_variants {
    use serde::{Deserialize, Serialize};

    use super::{Money, MoneyAmount, Nodes};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<Product>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub id: String,
        pub variants: Nodes<Variant>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variant {
        pub id: String,
        pub title: String,
        pub price: Option<Money>,
        pub inventory_item: Option<InventoryItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryItem {
        pub id: String,
        pub unit_cost: Option<MoneyAmount>,
    }
}

graphql_operation!(GetProductCollections, get_product_collections, PRODUCTS_DOCUMENT);

pub mod get_product_collections {
    use serde::{Deserialize, Serialize};

    use super::{CollectionNode, Nodes};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<Product>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub id: String,
        pub collections: Nodes<CollectionNode>,
    }
}

graphql_operation!(GetInventoryItemCost, get_inventory_item_cost, PRODUCTS_DOCUMENT);

pub mod get_inventory_item_cost {
    use serde::{Deserialize, Serialize};

    use super::MoneyAmount;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub inventory_item: Option<InventoryItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryItem {
        pub id: String,
        pub unit_cost: Option<MoneyAmount>,
    }
}

// =============================================================================
// Metafield operations
// =============================================================================

graphql_operation!(
    GetVariantRewardMetafields,
    get_variant_reward_metafields,
    METAFIELDS_DOCUMENT
);

pub mod get_variant_reward_metafields {
    use serde::{Deserialize, Serialize};

    use super::Nodes;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub namespace: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variant: Option<ProductVariant>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductVariant {
        pub id: String,
        pub product: Product,
        pub metafields: Nodes<Metafield>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Metafield {
        pub key: String,
        pub value: String,
    }
}

graphql_operation!(
    ProductVariantsBulkUpdate,
    product_variants_bulk_update,
    METAFIELDS_DOCUMENT
);

pub mod product_variants_bulk_update {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
        pub variants: Vec<ProductVariantsBulkInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct ProductVariantsBulkInput {
        pub id: String,
        pub metafields: Vec<MetafieldInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct MetafieldInput {
        pub namespace: String,
        pub key: String,
        #[serde(rename = "type")]
        pub type_: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variants_bulk_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub product_variants: Option<Vec<UpdatedVariant>>,
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UpdatedVariant {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserError {
        pub field: Option<Vec<String>>,
        pub message: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_names_operation() {
        let body = GetCollections::build_query(get_collections::Variables { first: 250 });
        assert_eq!(body.operation_name, "GetCollections");
        assert!(body.query.contains("query GetCollections("));
    }

    #[test]
    fn test_every_operation_is_in_its_document() {
        for (document, operation) in [
            (COLLECTIONS_DOCUMENT, "query GetCollectionProducts("),
            (PRODUCTS_DOCUMENT, "query GetProductVariants("),
            (PRODUCTS_DOCUMENT, "query GetProductCollections("),
            (PRODUCTS_DOCUMENT, "query GetInventoryItemCost("),
            (METAFIELDS_DOCUMENT, "query GetVariantRewardMetafields("),
            (METAFIELDS_DOCUMENT, "mutation ProductVariantsBulkUpdate("),
        ] {
            assert!(document.contains(operation), "missing {operation}");
        }
    }

    #[test]
    fn test_bulk_update_variables_serialize_camel_case() {
        let variables = product_variants_bulk_update::Variables {
            product_id: "gid://shopify/Product/1".to_string(),
            variants: vec![product_variants_bulk_update::ProductVariantsBulkInput {
                id: "gid://shopify/ProductVariant/2".to_string(),
                metafields: vec![product_variants_bulk_update::MetafieldInput {
                    namespace: "rewards".to_string(),
                    key: "elite_reward".to_string(),
                    type_: "number_decimal".to_string(),
                    value: "20".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&variables).unwrap_or_default();
        assert_eq!(json["productId"], "gid://shopify/Product/1");
        assert_eq!(json["variants"][0]["metafields"][0]["type"], "number_decimal");
    }
}
