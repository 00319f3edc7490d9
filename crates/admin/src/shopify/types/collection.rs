//! Collection domain types for Shopify Admin API.

use reward_sync_core::{CollectionId, ProductId};
use serde::{Deserialize, Serialize};

/// A Shopify collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection ID.
    pub id: CollectionId,
    /// Collection title, matched against category names.
    pub title: String,
    /// URL handle.
    pub handle: String,
}

impl Collection {
    /// Whether this collection's title names the given category.
    ///
    /// Titles and names are compared case-insensitively after trimming.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.title.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// Find the collection whose title matches a category name.
#[must_use]
pub fn find_collection_for<'a>(collections: &'a [Collection], name: &str) -> Option<&'a Collection> {
    collections.iter().find(|c| c.matches_name(name))
}

/// A product as listed inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionProduct {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// URL handle.
    pub handle: String,
}

/// A collection together with (a page of) its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWithProducts {
    /// The collection itself.
    pub collection: Collection,
    /// Products in the collection.
    pub products: Vec<CollectionProduct>,
}
