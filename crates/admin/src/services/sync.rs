//! Product and variant sync.
//!
//! Walks each category's Shopify collection, mirrors its products and
//! variants locally, recomputes rewards from the category margins and writes
//! them back to Shopify as variant metafields.
//!
//! Remote failures are logged and counted in the [`SyncReport`]; the sync
//! moves on to the next collection, product or variant. Database failures
//! abort the sync.

use std::collections::HashSet;
use std::fmt;

use futures::future::join_all;
use reward_sync_core::{CollectionId, GrossMargins, ProductId, calculate_rewards};
use tracing::{info, instrument, warn};

use super::{COLLECTION_PRODUCTS_PAGE, COLLECTIONS_PAGE, PRODUCT_VARIANTS_PAGE};
use crate::db::RewardStore;
use crate::error::AppError;
use crate::models::{Product, Variant};
use crate::shopify::{Collection, CollectionProduct, ShopifyAdmin, VariantPricing, find_collection_for};

/// Counts collected while syncing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Categories that were paired with a collection before syncing.
    pub categories_matched: usize,
    /// The collection list could not be fetched, so no category was paired.
    pub backfill_failed: bool,
    /// Collections whose products were synced.
    pub collections: usize,
    /// Collections that could not be fetched.
    pub collections_failed: usize,
    /// Products upserted.
    pub products: usize,
    /// Products whose variants could not be fetched.
    pub products_failed: usize,
    /// Variants upserted.
    pub variants: usize,
    /// Variants skipped because no reward could be computed.
    pub variants_skipped: usize,
    /// Metafield writes that Shopify rejected or that failed in transit.
    pub metafield_failures: usize,
}

impl SyncReport {
    /// Whether every remote call succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !self.backfill_failed
            && self.collections_failed == 0
            && self.products_failed == 0
            && self.variants_skipped == 0
            && self.metafield_failures == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Synced {} collections, {} products and {} variants",
            self.collections, self.products, self.variants
        )?;
        if !self.is_clean() {
            write!(
                f,
                " ({} collections failed, {} products failed, {} variants skipped, {} metafield writes failed)",
                self.collections_failed,
                self.products_failed,
                self.variants_skipped,
                self.metafield_failures
            )?;
        }
        if self.backfill_failed {
            f.write_str("; collection list unavailable, categories not paired")?;
        }
        Ok(())
    }
}

/// Outcome of syncing a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VariantOutcome {
    /// Row upserted and metafields written.
    Synced,
    /// Row upserted but the metafield write failed.
    MetafieldFailed,
    /// Nothing written.
    Skipped,
}

impl VariantOutcome {
    pub(crate) fn record(self, report: &mut SyncReport) {
        match self {
            Self::Synced => report.variants += 1,
            Self::MetafieldFailed => {
                report.variants += 1;
                report.metafield_failures += 1;
            }
            Self::Skipped => report.variants_skipped += 1,
        }
    }
}

/// Service that syncs collections, products and variants.
pub struct SyncService<'a, S, A> {
    store: &'a S,
    shopify: &'a A,
}

impl<'a, S, A> SyncService<'a, S, A>
where
    S: RewardStore,
    A: ShopifyAdmin,
{
    /// Create a sync service.
    #[must_use]
    pub const fn new(store: &'a S, shopify: &'a A) -> Self {
        Self { store, shopify }
    }

    /// Run the full manual sync.
    ///
    /// Backfills missing collection IDs, then syncs `collection_ids` (or,
    /// when empty, every category that has a collection).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a database operation fails. Shopify
    /// failures, including the collection list used for the backfill, are
    /// logged and counted in the report.
    #[instrument(skip(self, collection_ids), fields(requested = collection_ids.len()))]
    pub async fn run(&self, collection_ids: &[CollectionId]) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();

        match self.shopify.collections(COLLECTIONS_PAGE).await {
            Ok(collections) => {
                report.categories_matched = self.backfill_collections(&collections).await?;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch collections, skipping backfill");
                report.backfill_failed = true;
            }
        }

        let targets: Vec<CollectionId> = if collection_ids.is_empty() {
            self.store
                .list_categories()
                .await?
                .into_iter()
                .filter_map(|c| c.collection_id)
                .collect()
        } else {
            collection_ids.to_vec()
        };

        for collection_id in dedup(targets) {
            self.sync_collection(collection_id, &mut report).await?;
        }

        info!(
            backfill_failed = report.backfill_failed,
            collections = report.collections,
            collections_failed = report.collections_failed,
            products = report.products,
            products_failed = report.products_failed,
            variants = report.variants,
            variants_skipped = report.variants_skipped,
            metafield_failures = report.metafield_failures,
            "Sync finished"
        );

        Ok(report)
    }

    /// Pair categories without a collection with the collection of the same
    /// title (case-insensitive). Updates run concurrently.
    ///
    /// Returns the number of categories updated. A single failed update is
    /// logged and does not fail the backfill.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if categories cannot be listed.
    #[instrument(skip_all, fields(collections = collections.len()))]
    pub async fn backfill_collections(&self, collections: &[Collection]) -> Result<usize, AppError> {
        let categories = self.store.list_categories().await?;

        let mut taken: HashSet<CollectionId> =
            categories.iter().filter_map(|c| c.collection_id).collect();

        let mut pending = Vec::new();
        for category in categories.iter().filter(|c| c.collection_id.is_none()) {
            if let Some(collection) = find_collection_for(collections, &category.name)
                && taken.insert(collection.id)
            {
                pending.push((category.id, collection.id));
            }
        }

        let results = join_all(
            pending
                .iter()
                .map(|&(id, collection_id)| self.store.set_category_collection(id, collection_id)),
        )
        .await;

        let mut updated = 0;
        for ((category_id, collection_id), result) in pending.iter().zip(results) {
            match result {
                Ok(()) => updated += 1,
                Err(e) => warn!(
                    %category_id,
                    %collection_id,
                    error = %e,
                    "Failed to backfill category collection"
                ),
            }
        }

        if updated > 0 {
            info!(updated, "Backfilled category collections");
        }

        Ok(updated)
    }

    /// Sync every product of one collection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a database operation fails.
    #[instrument(skip(self, report), fields(collection_id = %collection_id))]
    pub async fn sync_collection(
        &self,
        collection_id: CollectionId,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        let collection = match self
            .shopify
            .collection_products(collection_id, COLLECTION_PRODUCTS_PAGE)
            .await
        {
            Ok(Some(collection)) => collection,
            Ok(None) => {
                warn!("Collection not found in Shopify, skipping");
                report.collections_failed += 1;
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch collection products, skipping");
                report.collections_failed += 1;
                return Ok(());
            }
        };

        let margins = self
            .store
            .category_for_collection(collection_id)
            .await?
            .map_or(GrossMargins::ZERO, |c| c.margins());

        for product in &collection.products {
            self.sync_product(product, collection_id, margins, report)
                .await?;
        }

        report.collections += 1;
        Ok(())
    }

    async fn sync_product(
        &self,
        product: &CollectionProduct,
        collection_id: CollectionId,
        margins: GrossMargins,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        self.store
            .upsert_product(&Product {
                id: product.id,
                title: product.title.clone(),
                collection_id: Some(collection_id),
            })
            .await?;
        report.products += 1;

        let variants = match self
            .shopify
            .product_variants(product.id, PRODUCT_VARIANTS_PAGE)
            .await
        {
            Ok(variants) => variants,
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "Failed to fetch variants, skipping product");
                report.products_failed += 1;
                return Ok(());
            }
        };

        for variant in &variants {
            sync_variant(self.store, self.shopify, product.id, variant, margins)
                .await?
                .record(report);
        }

        Ok(())
    }
}

/// Compute, store and publish the rewards of one variant.
///
/// # Errors
///
/// Returns `AppError::Database` if the variant cannot be stored.
pub(crate) async fn sync_variant<S, A>(
    store: &S,
    shopify: &A,
    product_id: ProductId,
    variant: &VariantPricing,
    margins: GrossMargins,
) -> Result<VariantOutcome, AppError>
where
    S: RewardStore,
    A: ShopifyAdmin,
{
    let cost = variant.cost_or_zero();
    let rewards = match calculate_rewards(variant.price, cost, margins) {
        Ok(rewards) => rewards,
        Err(e) => {
            warn!(variant_id = %variant.id, price = %variant.price, error = %e, "Cannot compute rewards, skipping variant");
            return Ok(VariantOutcome::Skipped);
        }
    };

    store
        .upsert_variant(&Variant::new(
            variant.id,
            product_id,
            variant.price,
            cost,
            rewards,
        ))
        .await?;

    match shopify
        .set_variant_rewards(product_id, variant.id, rewards)
        .await
    {
        Ok(()) => Ok(VariantOutcome::Synced),
        Err(e) => {
            warn!(variant_id = %variant.id, error = %e, "Failed to write reward metafields");
            Ok(VariantOutcome::MetafieldFailed)
        }
    }
}

fn dedup(ids: Vec<CollectionId>) -> Vec<CollectionId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
