//! Product and variant repository for database operations.

use std::collections::HashMap;

use reward_sync_core::{CollectionId, ProductId, VariantId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Product, ProductWithVariants, Variant};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    collection_id: Option<i64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            collection_id: row.collection_id.map(CollectionId::new),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    price: Decimal,
    unit_cost: Decimal,
    elite_reward: Decimal,
    regular_reward: Decimal,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            price: row.price,
            unit_cost: row.unit_cost,
            elite_reward: row.elite_reward,
            regular_reward: row.regular_reward,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product and variant database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product, or update its title and collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO rewards.product (id, title, collection_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                collection_id = EXCLUDED.collection_id,
                updated_at = NOW()
            ",
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(product.collection_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Whether a product is stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rewards.product WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Insert a variant, or update its pricing and rewards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// missing product).
    pub async fn upsert_variant(&self, variant: &Variant) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO rewards.variant
                (id, product_id, price, unit_cost, elite_reward, regular_reward)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET product_id = EXCLUDED.product_id,
                price = EXCLUDED.price,
                unit_cost = EXCLUDED.unit_cost,
                elite_reward = EXCLUDED.elite_reward,
                regular_reward = EXCLUDED.regular_reward,
                updated_at = NOW()
            ",
        )
        .bind(variant.id)
        .bind(variant.product_id)
        .bind(variant.price)
        .bind(variant.unit_cost)
        .bind(variant.elite_reward)
        .bind(variant.regular_reward)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// All products synced from a collection, with their variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_variants(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<ProductWithVariants>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, collection_id
            FROM rewards.product
            WHERE collection_id = $1
            ORDER BY id
            ",
        )
        .bind(collection_id)
        .fetch_all(self.pool)
        .await?;

        let variants = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT v.id, v.product_id, v.price, v.unit_cost, v.elite_reward, v.regular_reward
            FROM rewards.variant v
            JOIN rewards.product p ON p.id = v.product_id
            WHERE p.collection_id = $1
            ORDER BY v.id
            ",
        )
        .bind(collection_id)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<Variant>> = HashMap::new();
        for row in variants {
            by_product.entry(row.product_id).or_default().push(row.into());
        }

        Ok(products
            .into_iter()
            .map(|row| {
                let variants = by_product.remove(&row.id).unwrap_or_default();
                ProductWithVariants {
                    product: row.into(),
                    variants,
                }
            })
            .collect())
    }

    /// Delete every product synced from a collection. Variants cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM rewards.product WHERE collection_id = $1")
            .bind(collection_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
