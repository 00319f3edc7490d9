//! Category management.
//!
//! Categories carry the gross-margin percentages used to compute rewards and
//! are paired with Shopify collections by case-insensitive title.

use std::str::FromStr;

use reward_sync_core::{CategoryId, GrossMargins, RewardAmounts};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::COLLECTIONS_PAGE;
use super::sync::SyncService;
use crate::db::RewardStore;
use crate::error::AppError;
use crate::models::{Category, CategoryInput, CategoryWithProducts};
use crate::shopify::{ShopifyAdmin, find_collection_for};

/// Raw category fields as submitted by the admin form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
    /// Category name.
    #[serde(default)]
    pub name: String,
    /// Elite gross margin percentage.
    #[serde(default)]
    pub elite_gross_margin: String,
    /// Regular gross margin percentage.
    #[serde(default)]
    pub regular_gross_margin: String,
}

impl CategoryForm {
    /// Validate the form into a category input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name is blank or a margin is
    /// not a decimal number that fits `NUMERIC(10, 4)`.
    pub fn validate(&self) -> Result<CategoryInput, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let elite = parse_margin("elite gross margin", &self.elite_gross_margin)?;
        let regular = parse_margin("regular gross margin", &self.regular_gross_margin)?;

        Ok(CategoryInput {
            name: name.to_string(),
            margins: GrossMargins::new(elite, regular),
        })
    }
}

/// Largest number of decimal places a stored margin keeps.
const MARGIN_SCALE: u32 = 4;

/// Margins are stored as `NUMERIC(10, 4)`: the absolute value must stay below 10^6.
const MARGIN_LIMIT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

fn parse_margin(label: &str, value: &str) -> Result<Decimal, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }
    let margin = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| AppError::Validation(format!("{label} must be a number, got {value:?}")))?
        .normalize();

    if margin.abs() >= MARGIN_LIMIT {
        return Err(AppError::Validation(format!(
            "{label} must be below {MARGIN_LIMIT}, got {value}"
        )));
    }
    if margin.scale() > MARGIN_SCALE {
        return Err(AppError::Validation(format!(
            "{label} allows at most {MARGIN_SCALE} decimal places, got {value}"
        )));
    }
    Ok(margin)
}

/// What a category deletion removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Local products removed.
    pub products: usize,
    /// Local variants removed.
    pub variants: usize,
    /// Variants whose metafields could not be reset on Shopify.
    pub reset_failures: usize,
}

/// Service for category CRUD.
pub struct CategoryService<'a, S, A> {
    store: &'a S,
    shopify: &'a A,
}

impl<'a, S, A> CategoryService<'a, S, A>
where
    S: RewardStore,
    A: ShopifyAdmin,
{
    /// Create a category service.
    #[must_use]
    pub const fn new(store: &'a S, shopify: &'a A) -> Self {
        Self { store, shopify }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.store.list_categories().await?)
    }

    /// Create a category, pairing it with the collection of the same title.
    ///
    /// Validation happens before any database or Shopify call. Existing
    /// categories without a collection are backfilled along the way.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, `AppError::Shopify` if
    /// collections cannot be listed, and `AppError::Database` (conflict on a
    /// duplicate name) if the insert fails.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: &CategoryForm) -> Result<Category, AppError> {
        let input = form.validate()?;

        let collections = self.shopify.collections(COLLECTIONS_PAGE).await?;
        SyncService::new(self.store, self.shopify)
            .backfill_collections(&collections)
            .await?;

        let collection_id = find_collection_for(&collections, &input.name).map(|c| c.id);
        let category = self.store.create_category(&input, collection_id).await?;

        info!(
            category_id = %category.id,
            collection_id = ?category.collection_id,
            "Category created"
        );
        Ok(category)
    }

    /// Update a category's name and margins.
    ///
    /// If the new name matches a collection the category is paired with it.
    /// Otherwise the category is detached: the reward metafields of its
    /// products' variants are reset to zero and the local products and
    /// variants are removed.
    ///
    /// Margin changes do not recompute stored rewards; run a sync for that.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, `AppError::Database`
    /// (not found, conflict) if the category cannot be updated, and
    /// `AppError::Shopify` if collections cannot be listed.
    #[instrument(skip(self, form), fields(category_id = %id, name = %form.name))]
    pub async fn update(&self, id: CategoryId, form: &CategoryForm) -> Result<Category, AppError> {
        let input = form.validate()?;

        let collections = self.shopify.collections(COLLECTIONS_PAGE).await?;

        if let Some(collection) = find_collection_for(&collections, &input.name) {
            let category = self
                .store
                .update_category(id, &input, Some(collection.id))
                .await?;
            info!(collection_id = %collection.id, "Category updated");
            return Ok(category);
        }

        let existing = self
            .store
            .category_with_products(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

        let reset_failures = self.reset_rewards(&existing).await;

        if let Some(collection_id) = existing.category.collection_id {
            let removed = self.store.delete_collection_products(collection_id).await?;
            info!(%collection_id, removed, reset_failures, "Detached category from collection");
        }

        Ok(self.store.update_category(id, &input, None).await?)
    }

    /// Delete a category.
    ///
    /// Resets the reward metafields of every stored variant to zero on
    /// Shopify (failures are logged), then removes the variants, products and
    /// category locally in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category does not exist and
    /// `AppError::Database` if the local delete fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<DeleteOutcome, AppError> {
        let existing = self
            .store
            .category_with_products(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

        let reset_failures = self.reset_rewards(&existing).await;

        self.store.delete_category(id).await?;

        let outcome = DeleteOutcome {
            products: existing.products.len(),
            variants: existing.variant_ids().count(),
            reset_failures,
        };
        info!(
            products = outcome.products,
            variants = outcome.variants,
            reset_failures,
            "Category deleted"
        );
        Ok(outcome)
    }

    /// Write zero rewards onto every stored variant of a category.
    ///
    /// Returns the number of variants whose reset failed.
    async fn reset_rewards(&self, category: &CategoryWithProducts) -> usize {
        let mut failures = 0;
        for (product_id, variant_id) in category.variant_ids() {
            if let Err(e) = self
                .shopify
                .set_variant_rewards(product_id, variant_id, RewardAmounts::ZERO)
                .await
            {
                warn!(%product_id, %variant_id, error = %e, "Failed to reset reward metafields");
                failures += 1;
            }
        }
        failures
    }
}
