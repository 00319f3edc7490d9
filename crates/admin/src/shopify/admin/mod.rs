//! Shopify Admin API GraphQL client.
//!
//! This module provides a type-safe client for the Shopify Admin API
//! using GraphQL. Authenticates with the app's Admin API access token.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::GraphQLQuery;
use reward_sync_core::{
    CollectionId, InventoryItemId, ProductId, RewardAmounts, VariantId,
};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};

use crate::config::ShopifyAdminConfig;

use super::{
    AdminShopifyError, GraphQLError, GraphQLErrorLocation, ShopifyAdmin,
    types::{Collection, CollectionWithProducts, VariantPricing, VariantRewardMetafields},
};

mod collections;
mod metafields;
mod products;
pub mod queries;

/// Per-request timeout for Admin API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Security
///
/// This client holds the Admin API access token, which has HIGH PRIVILEGE
/// access to the store.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: String,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("store", &self.inner.store)
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client for the configured store.
    #[must_use]
    pub fn new(config: &ShopifyAdminConfig) -> Self {
        Self::with_endpoint(config, config.graphql_endpoint())
    }

    /// Create a client that sends requests to an explicit GraphQL endpoint.
    ///
    /// Used by tests to point the client at a mock server.
    #[must_use]
    pub fn with_endpoint(config: &ShopifyAdminConfig, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(AdminClientInner {
                client,
                store: config.store.clone(),
                endpoint: endpoint.into(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_secs(
                response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid access token or missing scope".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = serde_json::from_slice(&bytes)?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(AdminShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            AdminShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }
}

/// Parse a decimal scalar returned by the Admin API.
/// Seconds to wait after a 429, rounded up. Missing or invalid headers wait 60s.
fn retry_after_secs(header: Option<&str>) -> u64 {
    header
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map_or(60, |wait| wait.as_secs() + u64::from(wait.subsec_nanos() > 0))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, AdminShopifyError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| AdminShopifyError::Malformed(format!("{field} {value:?}: {e}")))
}

impl ShopifyAdmin for AdminClient {
    async fn collections(&self, first: i64) -> Result<Vec<Collection>, AdminShopifyError> {
        self.get_collections(first).await
    }

    async fn collection_products(
        &self,
        collection_id: CollectionId,
        first: i64,
    ) -> Result<Option<CollectionWithProducts>, AdminShopifyError> {
        self.get_collection_products(collection_id, first).await
    }

    async fn product_variants(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<VariantPricing>, AdminShopifyError> {
        self.get_product_variants(product_id, first).await
    }

    async fn product_collections(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<Collection>, AdminShopifyError> {
        self.get_product_collections(product_id, first).await
    }

    async fn inventory_item_unit_cost(
        &self,
        inventory_item_id: InventoryItemId,
    ) -> Result<Option<Decimal>, AdminShopifyError> {
        self.get_inventory_item_unit_cost(inventory_item_id).await
    }

    async fn variant_reward_metafields(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantRewardMetafields>, AdminShopifyError> {
        self.get_variant_reward_metafields(variant_id).await
    }

    async fn set_variant_rewards(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        rewards: RewardAmounts,
    ) -> Result<(), AdminShopifyError> {
        self.update_variant_rewards(product_id, variant_id, rewards)
            .await
    }
}
