//! Business logic services for the reward sync admin.
//!
//! # Services
//!
//! - `categories` - Category CRUD with collection matching
//! - `sync` - Collection → product → variant sync and metafield writes
//! - `webhooks` - `orders/create` and `products/create` processing
//! - `rewards_api` - Notifications to the external rewards endpoint
//!
//! Services borrow their dependencies and are generic over the
//! [`RewardStore`](crate::db::RewardStore) and
//! [`ShopifyAdmin`](crate::shopify::ShopifyAdmin) seams.

pub mod categories;
pub mod rewards_api;
pub mod sync;
pub mod webhooks;

pub use categories::{CategoryForm, CategoryService, DeleteOutcome};
pub use rewards_api::{
    RewardNotification, RewardNotifier, RewardsApiClient, RewardsApiError, spawn_notification,
};
pub use sync::{SyncReport, SyncService};
pub use webhooks::{OrderPayload, ProcessedOrder, ProductPayload, WebhookService};

/// Maximum collections fetched when matching categories.
pub const COLLECTIONS_PAGE: i64 = 250;

/// Maximum products fetched per collection.
pub const COLLECTION_PRODUCTS_PAGE: i64 = 100;

/// Maximum variants fetched per product.
pub const PRODUCT_VARIANTS_PAGE: i64 = 250;

/// Maximum collections resolved for a new product.
pub const PRODUCT_COLLECTIONS_PAGE: i64 = 10;
