//! Shopify webhook processing.
//!
//! - `orders/create`: sum the reward metafields of the ordered variants,
//!   store the order and produce the notification for the rewards API.
//! - `products/create`: compute and publish rewards for the new product's
//!   variants when one of its collections has a category.

use chrono::{DateTime, Utc};
use reward_sync_core::{
    CustomerTier, InventoryItemId, OrderId, ProductId, RewardAmounts, VariantId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::PRODUCT_COLLECTIONS_PAGE;
use super::rewards_api::RewardNotification;
use super::sync::{SyncReport, VariantOutcome, sync_variant};
use crate::db::RewardStore;
use crate::error::AppError;
use crate::models::{NewOrder, Order, Product};
use crate::shopify::{ShopifyAdmin, VariantPricing};

// =============================================================================
// Payloads
// =============================================================================

/// The parts of an `orders/create` payload that matter for rewards.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPayload {
    /// Shopify order ID.
    pub id: OrderId,
    /// Order name (e.g. `#1001`).
    #[serde(default)]
    pub name: String,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Customer, absent for some POS and draft orders.
    pub customer: Option<CustomerPayload>,
    /// Ordered line items.
    #[serde(default)]
    pub line_items: Vec<LineItemPayload>,
    /// Order total in shop and presentment currencies.
    pub current_total_price_set: Option<PriceSetPayload>,
}

impl OrderPayload {
    /// Tier of the ordering customer.
    #[must_use]
    pub fn customer_tier(&self) -> CustomerTier {
        self.customer
            .as_ref()
            .and_then(|c| c.tags.as_ref())
            .map_or(CustomerTier::Regular, CustomerTags::tier)
    }

    /// Currency of the order total in the shop's currency.
    #[must_use]
    pub fn shop_currency(&self) -> Option<String> {
        self.current_total_price_set
            .as_ref()
            .and_then(|set| set.shop_money.currency_code.clone())
    }
}

/// Customer block of an order payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerPayload {
    /// Customer tags.
    pub tags: Option<CustomerTags>,
}

/// Customer tags, sent by Shopify as a comma-separated string (some
/// integrations send an array).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CustomerTags {
    /// `["elite", "vip"]`
    List(Vec<String>),
    /// `"elite, vip"`
    Text(String),
}

impl CustomerTags {
    /// Tier implied by the tags.
    #[must_use]
    pub fn tier(&self) -> CustomerTier {
        match self {
            Self::List(tags) => CustomerTier::from_tags(tags),
            Self::Text(tags) => CustomerTier::from_tags(tags.split(',')),
        }
    }
}

/// A line item of an order payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPayload {
    /// Ordered variant; null for custom line items.
    pub variant_id: Option<VariantId>,
}

/// A money amount in shop and presentment currency.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSetPayload {
    /// Amount in the shop's currency.
    pub shop_money: MoneyPayload,
}

/// A money amount.
#[derive(Debug, Clone, Deserialize)]
pub struct MoneyPayload {
    /// Decimal amount as a string.
    pub amount: Option<String>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
}

/// The parts of a `products/create` payload that matter for rewards.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    /// Shopify product ID.
    pub id: ProductId,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Product variants.
    #[serde(default)]
    pub variants: Vec<ProductVariantPayload>,
}

/// A variant in a `products/create` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductVariantPayload {
    /// Shopify variant ID.
    pub id: VariantId,
    /// Sale price (a decimal string).
    pub price: Option<Decimal>,
    /// Inventory item holding the unit cost.
    pub inventory_item_id: Option<InventoryItemId>,
}

// =============================================================================
// Service
// =============================================================================

/// A stored order and the notification to send for it.
#[derive(Debug, Clone)]
pub struct ProcessedOrder {
    /// The stored order.
    pub order: Order,
    /// Notification for the rewards API.
    pub notification: RewardNotification,
}

/// Service that processes webhook payloads.
pub struct WebhookService<'a, S, A> {
    store: &'a S,
    shopify: &'a A,
}

impl<'a, S, A> WebhookService<'a, S, A>
where
    S: RewardStore,
    A: ShopifyAdmin,
{
    /// Create a webhook service.
    #[must_use]
    pub const fn new(store: &'a S, shopify: &'a A) -> Self {
        Self { store, shopify }
    }

    /// Process an `orders/create` payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` (and stores nothing) if an ordered
    /// variant belongs to a product that is not stored locally.
    /// Returns `AppError::Shopify` or `AppError::Database` if a call fails.
    #[instrument(skip(self, payload), fields(order_id = %payload.id, line_items = payload.line_items.len()))]
    pub async fn process_order(&self, payload: &OrderPayload) -> Result<ProcessedOrder, AppError> {
        let customer_type = payload.customer_tier();
        let mut rewards = RewardAmounts::ZERO;

        for variant_id in payload.line_items.iter().filter_map(|item| item.variant_id) {
            let Some(metafields) = self.shopify.variant_reward_metafields(variant_id).await?
            else {
                warn!(%variant_id, "Variant not found in Shopify, skipping line item");
                continue;
            };

            if !self.store.product_exists(metafields.product_id).await? {
                return Err(AppError::NotFound(format!(
                    "product {} is not stored, order not created",
                    metafields.product_id
                )));
            }

            rewards += metafields.rewards();
        }

        let now = Utc::now();
        let order = self
            .store
            .upsert_order(&NewOrder {
                id: payload.id,
                name: payload.name.clone(),
                rewards,
                customer_type,
                created_at: payload.created_at.unwrap_or(now),
                updated_at: payload.updated_at.unwrap_or(now),
            })
            .await?;

        info!(
            %customer_type,
            elite_reward = %order.elite_reward,
            regular_reward = %order.regular_reward,
            "Order stored"
        );

        let notification =
            RewardNotification::new(order.id, order.customer_reward(), payload.shop_currency());

        Ok(ProcessedOrder {
            order,
            notification,
        })
    }

    /// Process a `products/create` payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Shopify` if the product's collections cannot be
    /// fetched and `AppError::Database` if a database operation fails.
    #[instrument(skip(self, payload), fields(product_id = %payload.id, variants = payload.variants.len()))]
    pub async fn process_product_created(
        &self,
        payload: &ProductPayload,
    ) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();

        let collections = self
            .shopify
            .product_collections(payload.id, PRODUCT_COLLECTIONS_PAGE)
            .await?;

        for collection in &collections {
            let Some(category) = self.store.category_for_collection(collection.id).await? else {
                continue;
            };

            self.store
                .upsert_product(&Product {
                    id: payload.id,
                    title: payload.title.clone(),
                    collection_id: Some(collection.id),
                })
                .await?;
            report.products += 1;

            for variant in &payload.variants {
                let Some(pricing) = self.variant_pricing(variant).await else {
                    VariantOutcome::Skipped.record(&mut report);
                    continue;
                };
                sync_variant(
                    self.store,
                    self.shopify,
                    payload.id,
                    &pricing,
                    category.margins(),
                )
                .await?
                .record(&mut report);
            }

            report.collections += 1;
        }

        info!(
            collections = report.collections,
            variants = report.variants,
            metafield_failures = report.metafield_failures,
            "Product processed"
        );

        Ok(report)
    }

    /// Price from the payload plus the unit cost from Shopify.
    ///
    /// Returns `None` (after logging) if the cost lookup fails.
    async fn variant_pricing(&self, variant: &ProductVariantPayload) -> Option<VariantPricing> {
        let unit_cost = match variant.inventory_item_id {
            Some(item_id) => match self.shopify.inventory_item_unit_cost(item_id).await {
                Ok(cost) => cost,
                Err(e) => {
                    warn!(variant_id = %variant.id, error = %e, "Failed to fetch unit cost, skipping variant");
                    return None;
                }
            },
            None => None,
        };

        Some(VariantPricing {
            id: variant.id,
            title: String::new(),
            price: variant.price.unwrap_or(Decimal::ZERO),
            inventory_item_id: variant.inventory_item_id,
            unit_cost,
        })
    }
}
