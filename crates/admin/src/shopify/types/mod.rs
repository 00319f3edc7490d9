//! Domain types for Shopify Admin API.
//!
//! These types provide a clean, ergonomic API separate from the raw GraphQL
//! response types in `admin::queries`. IDs are already parsed into the
//! typed Shopify IDs from `reward_sync_core`.

pub mod collection;
pub mod metafield;
pub mod product;

pub use collection::*;
pub use metafield::*;
pub use product::*;
