//! Integration tests for Reward Sync.
//!
//! The services are exercised end to end against in-memory stand-ins for
//! their three dependencies:
//!
//! - [`MemoryStore`] - a [`RewardStore`] keeping rows in maps
//! - [`FakeShopify`] - a [`ShopifyAdmin`] serving a configurable catalogue
//!   and recording metafield writes
//! - [`FakeNotifier`] - a [`RewardNotifier`] collecting notifications
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p reward-sync-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use reward_sync_admin::db::{RepositoryError, RewardStore};
use reward_sync_admin::models::{
    Category, CategoryInput, CategoryWithProducts, NewOrder, Order, Product, ProductWithVariants,
    Variant,
};
use reward_sync_admin::services::{RewardNotification, RewardNotifier, RewardsApiError};
use reward_sync_admin::shopify::{
    AdminShopifyError, Collection, CollectionProduct, CollectionWithProducts, ELITE_REWARD_KEY,
    REGULAR_REWARD_KEY, RewardMetafield, ShopifyAdmin, VariantPricing, VariantRewardMetafields,
};
use reward_sync_core::{
    CategoryId, CollectionId, InventoryItemId, OrderId, ProductId, RewardAmounts, VariantId,
};
use rust_decimal::Decimal;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the pricing Shopify reports for a variant.
///
/// The inventory item shares the variant's numeric ID.
#[must_use]
pub fn variant(id: i64, price: Decimal, unit_cost: Option<Decimal>) -> VariantPricing {
    VariantPricing {
        id: VariantId::new(id),
        title: format!("Variant {id}"),
        price,
        inventory_item_id: Some(InventoryItemId::new(id)),
        unit_cost,
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Default)]
struct StoreData {
    next_category_id: i32,
    categories: Vec<Category>,
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, Variant>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory [`RewardStore`] with the constraints of the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// All stored products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = lock(&self.data).products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        products
    }

    /// A stored variant.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<Variant> {
        lock(&self.data).variants.get(&id).cloned()
    }

    /// Number of stored variants.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        lock(&self.data).variants.len()
    }

    /// A stored order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        lock(&self.data).orders.get(&id).cloned()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl StoreData {
    fn category_mut(&mut self, id: CategoryId) -> Result<&mut Category, RepositoryError> {
        self.categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn check_unique(
        &self,
        id: Option<CategoryId>,
        name: &str,
        collection_id: Option<CollectionId>,
    ) -> Result<(), RepositoryError> {
        for other in self.categories.iter().filter(|c| Some(c.id) != id) {
            if other.name == name {
                return Err(RepositoryError::Conflict(format!(
                    "category {name:?} already exists"
                )));
            }
            if collection_id.is_some() && other.collection_id == collection_id {
                return Err(RepositoryError::Conflict(
                    "collection already has a category".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn remove_collection_products(&mut self, collection_id: CollectionId) -> u64 {
        let removed: Vec<ProductId> = self
            .products
            .values()
            .filter(|p| p.collection_id == Some(collection_id))
            .map(|p| p.id)
            .collect();
        for id in &removed {
            self.products.remove(id);
        }
        self.variants.retain(|_, v| !removed.contains(&v.product_id));
        removed.len() as u64
    }
}

impl RewardStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = lock(&self.data).categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_for_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(lock(&self.data)
            .categories
            .iter()
            .find(|c| c.collection_id == Some(collection_id))
            .cloned())
    }

    async fn category_with_products(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryWithProducts>, RepositoryError> {
        let data = lock(&self.data);
        let Some(category) = data.categories.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };

        let mut products: Vec<ProductWithVariants> = match category.collection_id {
            Some(collection_id) => data
                .products
                .values()
                .filter(|p| p.collection_id == Some(collection_id))
                .map(|product| {
                    let mut variants: Vec<Variant> = data
                        .variants
                        .values()
                        .filter(|v| v.product_id == product.id)
                        .cloned()
                        .collect();
                    variants.sort_by_key(|v| v.id);
                    ProductWithVariants {
                        product: product.clone(),
                        variants,
                    }
                })
                .collect(),
            None => Vec::new(),
        };
        products.sort_by_key(|p| p.product.id);

        Ok(Some(CategoryWithProducts { category, products }))
    }

    async fn create_category(
        &self,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        self.record_write();
        let mut data = lock(&self.data);
        data.check_unique(None, &input.name, collection_id)?;

        data.next_category_id += 1;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(data.next_category_id),
            name: input.name.clone(),
            elite_gross_margin: input.margins.elite,
            regular_gross_margin: input.margins.regular,
            collection_id,
            created_at: now,
            updated_at: now,
        };
        data.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        collection_id: Option<CollectionId>,
    ) -> Result<Category, RepositoryError> {
        self.record_write();
        let mut data = lock(&self.data);
        data.check_unique(Some(id), &input.name, collection_id)?;

        let category = data.category_mut(id)?;
        category.name.clone_from(&input.name);
        category.elite_gross_margin = input.margins.elite;
        category.regular_gross_margin = input.margins.regular;
        category.collection_id = collection_id;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn set_category_collection(
        &self,
        id: CategoryId,
        collection_id: CollectionId,
    ) -> Result<(), RepositoryError> {
        self.record_write();
        let mut data = lock(&self.data);
        data.category_mut(id)?;
        if data
            .categories
            .iter()
            .any(|c| c.id != id && c.collection_id == Some(collection_id))
        {
            return Err(RepositoryError::Conflict(
                "collection already has a category".to_string(),
            ));
        }
        let category = data.category_mut(id)?;
        category.collection_id = Some(collection_id);
        category.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        self.record_write();
        let mut data = lock(&self.data);
        let collection_id = data.category_mut(id)?.collection_id;
        if let Some(collection_id) = collection_id {
            data.remove_collection_products(collection_id);
        }
        data.categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn delete_collection_products(
        &self,
        collection_id: CollectionId,
    ) -> Result<u64, RepositoryError> {
        self.record_write();
        Ok(lock(&self.data).remove_collection_products(collection_id))
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        self.record_write();
        lock(&self.data)
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.data).products.contains_key(&id))
    }

    async fn upsert_variant(&self, variant: &Variant) -> Result<(), RepositoryError> {
        self.record_write();
        let mut data = lock(&self.data);
        if !data.products.contains_key(&variant.product_id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} does not exist",
                variant.product_id
            )));
        }
        data.variants.insert(variant.id, variant.clone());
        Ok(())
    }

    async fn upsert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.record_write();
        let stored = Order {
            id: order.id,
            name: order.name.clone(),
            elite_reward: order.rewards.elite,
            regular_reward: order.rewards.regular,
            customer_type: order.customer_type,
            created_at: order.created_at,
            updated_at: order.updated_at,
        };
        lock(&self.data).orders.insert(order.id, stored.clone());
        Ok(stored)
    }

    async fn list_orders(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = lock(&self.data).orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(orders)
    }
}

// =============================================================================
// FakeShopify
// =============================================================================

#[derive(Default)]
struct Catalogue {
    collections: Vec<Collection>,
    collection_products: HashMap<CollectionId, Vec<CollectionProduct>>,
    variants: HashMap<ProductId, Vec<VariantPricing>>,
    unit_costs: HashMap<InventoryItemId, Decimal>,
    metafields: HashMap<VariantId, VariantRewardMetafields>,
    failing_writes: HashSet<VariantId>,
    collections_unavailable: bool,
    writes: Vec<(ProductId, VariantId, RewardAmounts)>,
}

/// In-memory [`ShopifyAdmin`].
///
/// Metafield writes are applied to the served metafields, so a sync followed
/// by an order reads back what the sync wrote.
#[derive(Default)]
pub struct FakeShopify {
    catalogue: Mutex<Catalogue>,
    calls: AtomicUsize,
}

impl FakeShopify {
    /// Create an empty shop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection.
    pub fn add_collection(&self, id: i64, title: &str) -> CollectionId {
        let id = CollectionId::new(id);
        let mut catalogue = lock(&self.catalogue);
        catalogue.collections.push(Collection {
            id,
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
        });
        catalogue.collection_products.entry(id).or_default();
        id
    }

    /// Add a product with its variants to a collection.
    ///
    /// Unit costs are also served through the variants' inventory items.
    pub fn add_product(
        &self,
        collection_id: CollectionId,
        id: i64,
        title: &str,
        variants: Vec<VariantPricing>,
    ) -> ProductId {
        let id = ProductId::new(id);
        let mut catalogue = lock(&self.catalogue);
        catalogue
            .collection_products
            .entry(collection_id)
            .or_default()
            .push(CollectionProduct {
                id,
                title: title.to_string(),
                handle: title.to_lowercase().replace(' ', "-"),
            });
        for v in &variants {
            if let (Some(item), Some(cost)) = (v.inventory_item_id, v.unit_cost) {
                catalogue.unit_costs.insert(item, cost);
            }
        }
        catalogue.variants.insert(id, variants);
        id
    }

    /// Serve raw reward metafield values for a variant.
    pub fn set_metafields(&self, variant_id: i64, product_id: i64, elite: &str, regular: &str) {
        let variant_id = VariantId::new(variant_id);
        lock(&self.catalogue).metafields.insert(
            variant_id,
            VariantRewardMetafields {
                variant_id,
                product_id: ProductId::new(product_id),
                metafields: vec![
                    RewardMetafield {
                        key: ELITE_REWARD_KEY.to_string(),
                        value: elite.to_string(),
                    },
                    RewardMetafield {
                        key: REGULAR_REWARD_KEY.to_string(),
                        value: regular.to_string(),
                    },
                ],
            },
        );
    }

    /// Make metafield writes for a variant fail.
    pub fn fail_writes_for(&self, variant_id: i64) {
        lock(&self.catalogue)
            .failing_writes
            .insert(VariantId::new(variant_id));
    }

    /// Make the collection list fail as if Shopify were rate limiting.
    pub fn fail_collections(&self) {
        lock(&self.catalogue).collections_unavailable = true;
    }

    /// Successful metafield writes, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(ProductId, VariantId, RewardAmounts)> {
        lock(&self.catalogue).writes.clone()
    }

    /// The last rewards written to a variant.
    #[must_use]
    pub fn written_rewards(&self, variant_id: i64) -> Option<RewardAmounts> {
        let variant_id = VariantId::new(variant_id);
        lock(&self.catalogue)
            .writes
            .iter()
            .rev()
            .find(|(_, v, _)| *v == variant_id)
            .map(|(_, _, rewards)| *rewards)
    }

    /// The metafield values currently served for a variant.
    #[must_use]
    pub fn metafield_values(&self, variant_id: i64) -> Vec<(String, String)> {
        lock(&self.catalogue)
            .metafields
            .get(&VariantId::new(variant_id))
            .map(|m| {
                m.metafields
                    .iter()
                    .map(|f| (f.key.clone(), f.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of API calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn first_n<T: Clone>(items: &[T], first: i64) -> Vec<T> {
    items
        .iter()
        .take(usize::try_from(first).unwrap_or(0))
        .cloned()
        .collect()
}

impl ShopifyAdmin for FakeShopify {
    async fn collections(&self, first: i64) -> Result<Vec<Collection>, AdminShopifyError> {
        self.record_call();
        let catalogue = lock(&self.catalogue);
        if catalogue.collections_unavailable {
            return Err(AdminShopifyError::RateLimited(2));
        }
        Ok(first_n(&catalogue.collections, first))
    }

    async fn collection_products(
        &self,
        collection_id: CollectionId,
        first: i64,
    ) -> Result<Option<CollectionWithProducts>, AdminShopifyError> {
        self.record_call();
        let catalogue = lock(&self.catalogue);
        let Some(collection) = catalogue
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .cloned()
        else {
            return Ok(None);
        };
        let products = catalogue
            .collection_products
            .get(&collection_id)
            .map(|p| first_n(p, first))
            .unwrap_or_default();
        Ok(Some(CollectionWithProducts {
            collection,
            products,
        }))
    }

    async fn product_variants(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<VariantPricing>, AdminShopifyError> {
        self.record_call();
        Ok(lock(&self.catalogue)
            .variants
            .get(&product_id)
            .map(|v| first_n(v, first))
            .unwrap_or_default())
    }

    async fn product_collections(
        &self,
        product_id: ProductId,
        first: i64,
    ) -> Result<Vec<Collection>, AdminShopifyError> {
        self.record_call();
        let catalogue = lock(&self.catalogue);
        let collections: Vec<Collection> = catalogue
            .collections
            .iter()
            .filter(|c| {
                catalogue
                    .collection_products
                    .get(&c.id)
                    .is_some_and(|products| products.iter().any(|p| p.id == product_id))
            })
            .cloned()
            .collect();
        Ok(first_n(&collections, first))
    }

    async fn inventory_item_unit_cost(
        &self,
        inventory_item_id: InventoryItemId,
    ) -> Result<Option<Decimal>, AdminShopifyError> {
        self.record_call();
        Ok(lock(&self.catalogue)
            .unit_costs
            .get(&inventory_item_id)
            .copied())
    }

    async fn variant_reward_metafields(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantRewardMetafields>, AdminShopifyError> {
        self.record_call();
        Ok(lock(&self.catalogue).metafields.get(&variant_id).cloned())
    }

    async fn set_variant_rewards(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        rewards: RewardAmounts,
    ) -> Result<(), AdminShopifyError> {
        self.record_call();
        let mut catalogue = lock(&self.catalogue);
        if catalogue.failing_writes.contains(&variant_id) {
            return Err(AdminShopifyError::UserError(format!(
                "variants.0.metafields: variant {variant_id} is locked"
            )));
        }

        catalogue.writes.push((product_id, variant_id, rewards));
        catalogue.metafields.insert(
            variant_id,
            VariantRewardMetafields {
                variant_id,
                product_id,
                metafields: vec![
                    RewardMetafield {
                        key: ELITE_REWARD_KEY.to_string(),
                        value: rewards.elite_metafield_value(),
                    },
                    RewardMetafield {
                        key: REGULAR_REWARD_KEY.to_string(),
                        value: rewards.regular_metafield_value(),
                    },
                ],
            },
        );
        Ok(())
    }
}

// =============================================================================
// FakeNotifier
// =============================================================================

/// [`RewardNotifier`] that records notifications. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<RewardNotification>>>,
}

impl FakeNotifier {
    /// Create a notifier with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    #[must_use]
    pub fn sent(&self) -> Vec<RewardNotification> {
        lock(&self.sent).clone()
    }
}

impl RewardNotifier for FakeNotifier {
    async fn notify(&self, notification: &RewardNotification) -> Result<(), RewardsApiError> {
        lock(&self.sent).push(notification.clone());
        Ok(())
    }
}
