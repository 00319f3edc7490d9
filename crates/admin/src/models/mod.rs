//! Domain models for the reward sync admin.
//!
//! These are the validated shapes the repositories return and the services
//! work with. Row types stay private to `crate::db`.

pub mod category;
pub mod order;
pub mod product;

pub use category::{Category, CategoryInput, CategoryWithProducts};
pub use order::{NewOrder, Order};
pub use product::{Product, ProductWithVariants, Variant};
