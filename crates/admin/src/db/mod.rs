//! Database operations for the reward sync `PostgreSQL` database.
//!
//! # Schema: `rewards`
//!
//! ## Tables
//!
//! - `category` - Merchant categories with gross-margin percentages
//! - `product` - Shopify products synced from a category's collection
//! - `variant` - Product variants with computed rewards (cascade on product)
//! - `order` - Orders received through the `orders/create` webhook
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p reward-sync-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod products;

use std::future::Future;
use std::time::Duration;

use reward_sync_core::{CategoryId, CollectionId, ProductId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

use crate::models::{
    Category, CategoryInput, CategoryWithProducts, NewOrder, Order, Product, Variant,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique category name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_or_database(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Persistence operations the reward services depend on.
///
/// [`PgRewardStore`] is the production implementation; tests use an
/// in-memory store.
pub trait RewardStore: Send + Sync {
    /// All categories, ordered by name.
    fn list_categories(&self)
    -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// The category paired with a collection, if any.
    fn category_for_collection(
        &self,
        collection_id: CollectionId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// A category with its stored products and variants.
    fn category_with_products(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<CategoryWithProducts>, RepositoryError>> + Send;

    /// Insert a category. A duplicate name is a `Conflict`.
    fn create_category(
        &self,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// Update a category's name, margins and collection.
    fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// Record the collection found for a category.
    fn set_category_collection(
        &self,
        id: CategoryId,
        collection_id: CollectionId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a category with its products and variants in one transaction.
    fn delete_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every product (and variant) synced from a collection.
    ///
    /// Returns the number of products removed.
    fn delete_collection_products(
        &self,
        collection_id: CollectionId,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Insert or update a product.
    fn upsert_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether a product is stored locally.
    fn product_exists(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert or update a variant. Its product must already exist.
    fn upsert_variant(
        &self,
        variant: &Variant,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert or update an order.
    fn upsert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Most recent orders first.
    fn list_orders(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;
}

/// `PostgreSQL`-backed [`RewardStore`].
#[derive(Debug, Clone)]
pub struct PgRewardStore {
    pool: PgPool,
}

impl PgRewardStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (for health checks).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RewardStore for PgRewardStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CategoryRepository::new(&self.pool).list_all().await
    }

    async fn category_for_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Category>, RepositoryError> {
        CategoryRepository::new(&self.pool)
            .get_by_collection(collection_id)
            .await
    }

    async fn category_with_products(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryWithProducts>, RepositoryError> {
        let Some(category) = CategoryRepository::new(&self.pool).get_by_id(id).await? else {
            return Ok(None);
        };

        let products = match category.collection_id {
            Some(collection_id) => {
                ProductRepository::new(&self.pool)
                    .list_with_variants(collection_id)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(Some(CategoryWithProducts { category, products }))
    }

    async fn create_category(
        &self,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        CategoryRepository::new(&self.pool)
            .create(input, collection_id)
            .await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        CategoryRepository::new(&self.pool)
            .update(id, input, collection_id)
            .await
    }

    async fn set_category_collection(
        &self,
        id: CategoryId,
        collection_id: CollectionId,
    ) -> Result<(), RepositoryError> {
        CategoryRepository::new(&self.pool)
            .set_collection(id, collection_id)
            .await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        CategoryRepository::new(&self.pool).delete_cascade(id).await
    }

    async fn delete_collection_products(
        &self,
        collection_id: CollectionId,
    ) -> Result<u64, RepositoryError> {
        ProductRepository::new(&self.pool)
            .delete_by_collection(collection_id)
            .await
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool).upsert(product).await
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        ProductRepository::new(&self.pool).exists(id).await
    }

    async fn upsert_variant(&self, variant: &Variant) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool)
            .upsert_variant(variant)
            .await
    }

    async fn upsert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).upsert(order).await
    }

    async fn list_orders(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_recent(limit).await
    }
}
