//! Category repository for database operations.

use chrono::{DateTime, Utc};
use reward_sync_core::{CategoryId, CollectionId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{RepositoryError, conflict_or_database};
use crate::models::{Category, CategoryInput};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    elite_gross_margin: Decimal,
    regular_gross_margin: Decimal,
    collection_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            elite_gross_margin: row.elite_gross_margin,
            regular_gross_margin: row.regular_gross_margin,
            collection_id: row.collection_id.map(CollectionId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, elite_gross_margin, regular_gross_margin, \
                                collection_id, created_at, updated_at";

const DUPLICATE_NAME: &str = "a category with this name or collection already exists";

const COLLECTION_TAKEN: &str = "the collection already belongs to another category";

// =============================================================================
// Repository
// =============================================================================

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM rewards.category ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM rewards.category WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the category paired with a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM rewards.category WHERE collection_id = $1"
        ))
        .bind(collection_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or collection is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO rewards.category
                (name, elite_gross_margin, regular_gross_margin, collection_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(input.margins.elite)
        .bind(input.margins.regular)
        .bind(collection_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, DUPLICATE_NAME))?;

        Ok(row.into())
    }

    /// Update a category's name, margins and collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the name or collection is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE rewards.category
            SET name = $2,
                elite_gross_margin = $3,
                regular_gross_margin = $4,
                collection_id = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.margins.elite)
        .bind(input.margins.regular)
        .bind(collection_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, DUPLICATE_NAME))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Record the collection matched to a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if another category already has
    /// the collection.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_collection(
        &self,
        id: CategoryId,
        collection_id: CollectionId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE rewards.category
            SET collection_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(collection_id)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, COLLECTION_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a category together with its products and variants.
    ///
    /// Runs in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn delete_cascade(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let collection_id: Option<Option<i64>> = sqlx::query_scalar(
            "SELECT collection_id FROM rewards.category WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(collection_id) = collection_id else {
            return Err(RepositoryError::NotFound);
        };

        if let Some(collection_id) = collection_id {
            sqlx::query(
                r"
                DELETE FROM rewards.variant
                WHERE product_id IN (
                    SELECT id FROM rewards.product WHERE collection_id = $1
                )
                ",
            )
            .bind(collection_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM rewards.product WHERE collection_id = $1")
                .bind(collection_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM rewards.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
