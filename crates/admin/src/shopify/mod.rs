//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **This module holds the store's Admin API access token.** It can read and
//! write products, variants, metafields and inventory for the whole store.
//!
//! # Architecture
//!
//! - GraphQL documents implement `graphql_client::GraphQLQuery`
//! - Requests are sent with `reqwest` to the store's Admin API endpoint
//! - Raw responses are converted into the domain types in [`types`]
//! - Services talk to Shopify through the [`ShopifyAdmin`] trait so they can
//!   be exercised without a network
//!
//! # Example
//!
//! ```rust,ignore
//! use reward_sync_admin::shopify::{AdminClient, ShopifyAdmin};
//!
//! let client = AdminClient::new(&config.shopify);
//!
//! // Every collection in the store (first 250)
//! let collections = client.collections(250).await?;
//!
//! // Write rewards onto a variant
//! client.set_variant_rewards(product_id, variant_id, rewards).await?;
//! ```

mod admin;
pub mod types;

use std::future::Future;

use reward_sync_core::{
    CollectionId, GidError, InventoryItemId, ProductId, RewardAmounts, VariantId,
};
use rust_decimal::Decimal;
use thiserror::Error;

pub use admin::AdminClient;
pub use types::*;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A response field could not be interpreted (bad ID, bad decimal).
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl From<GidError> for AdminShopifyError {
    fn from(err: GidError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The Shopify Admin API operations the reward services depend on.
///
/// Implemented by [`AdminClient`]; tests substitute in-memory fakes.
pub trait ShopifyAdmin: Send + Sync {
    /// List the store's collections (first page of `first`).
    fn collections(
        &self,
        first: i64,
    ) -> impl Future<Output = Result<Vec<Collection>, AdminShopifyError>> + Send;

    /// Fetch a collection with the first `first` of its products.
    ///
    /// Returns `None` if Shopify does not know the collection.
    fn collection_products(
        &self,
        collection_id: CollectionId,
        first: i64,
    ) -> impl Future<Output = Result<Option<CollectionWithProducts>, AdminShopifyError>> + Send;

    /// Price and unit cost of the first `first` variants of a product.
    fn product_variants(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> impl Future<Output = Result<Vec<VariantPricing>, AdminShopifyError>> + Send;

    /// Collections a product belongs to (first `first`).
    fn product_collections(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> impl Future<Output = Result<Vec<Collection>, AdminShopifyError>> + Send;

    /// Unit cost recorded on an inventory item, if any.
    fn inventory_item_unit_cost(
        &self,
        inventory_item_id: InventoryItemId,
    ) -> impl Future<Output = Result<Option<Decimal>, AdminShopifyError>> + Send;

    /// Reward metafields of a variant together with its product ID.
    ///
    /// Returns `None` if Shopify does not know the variant.
    fn variant_reward_metafields(
        &self,
        variant_id: VariantId,
    ) -> impl Future<Output = Result<Option<VariantRewardMetafields>, AdminShopifyError>> + Send;

    /// Write both reward metafields onto a variant.
    fn set_variant_rewards(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        rewards: RewardAmounts,
    ) -> impl Future<Output = Result<(), AdminShopifyError>> + Send;
}
