//! Newtype IDs for type-safe entity references.
//!
//! Two families of IDs live here:
//!
//! - Local IDs (`define_id!`) wrap the `i32` serial keys of rows that only
//!   exist in our database, such as categories.
//! - Shopify IDs (`define_shopify_id!`) wrap the numeric `i64` part of a
//!   Shopify resource ID and convert to and from GraphQL global IDs
//!   (`gid://shopify/Product/123`).

use thiserror::Error;

/// Prefix shared by every Shopify GraphQL global ID.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Errors produced when parsing a Shopify global ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GidError {
    /// The value does not start with `gid://shopify/<resource>/`.
    #[error("expected a gid://shopify/{expected}/<id> value, got {value:?}")]
    WrongResource {
        /// Resource name that was expected.
        expected: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The trailing segment is not a number.
    #[error("invalid numeric id in {0:?}")]
    InvalidNumber(String),
}

/// Macro to define a type-safe local ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use reward_sync_core::define_id;
/// define_id!(TagId);
/// define_id!(NoteId);
///
/// let tag_id = TagId::new(1);
/// let note_id = NoteId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: TagId = note_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// Macro to define a Shopify resource ID wrapper.
///
/// Creates a newtype wrapper around the numeric `i64` part of a Shopify ID
/// with everything `define_id!` provides, plus:
/// - `gid()` to format the GraphQL global ID
/// - `from_gid()` to parse one back, rejecting other resource types
/// - `FromStr` for bare numeric strings (form fields, webhook payloads)
///
/// # Example
///
/// ```rust
/// # use reward_sync_core::define_shopify_id;
/// define_shopify_id!(LocationId, "Location");
///
/// let id = LocationId::new(42);
/// assert_eq!(id.gid(), "gid://shopify/Location/42");
/// assert_eq!(LocationId::from_gid("gid://shopify/Location/42"), Ok(id));
/// ```
#[macro_export]
macro_rules! define_shopify_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Shopify resource name used in global IDs.
            pub const RESOURCE: &'static str = $resource;

            /// Create a new ID from the numeric Shopify ID.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying numeric ID.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Format as a GraphQL global ID.
            #[must_use]
            pub fn gid(&self) -> String {
                format!("{}{}/{}", $crate::types::id::GID_PREFIX, $resource, self.0)
            }

            /// Parse a GraphQL global ID of this resource type.
            ///
            /// # Errors
            ///
            /// Returns `GidError` if the value names another resource or the
            /// numeric part is malformed.
            pub fn from_gid(gid: &str) -> Result<Self, $crate::types::id::GidError> {
                let numeric = gid
                    .strip_prefix($crate::types::id::GID_PREFIX)
                    .and_then(|rest| rest.strip_prefix($resource))
                    .and_then(|rest| rest.strip_prefix('/'))
                    .ok_or_else(|| $crate::types::id::GidError::WrongResource {
                        expected: $resource,
                        value: gid.to_string(),
                    })?;
                // Some GIDs carry query parameters (e.g. `?inventory_item_id=`)
                let numeric = numeric.split('?').next().unwrap_or(numeric);
                numeric
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| $crate::types::id::GidError::InvalidNumber(gid.to_string()))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i64 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i64 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Local entity IDs
define_id!(CategoryId);

// Shopify resource IDs
define_shopify_id!(CollectionId, "Collection");
define_shopify_id!(ProductId, "Product");
define_shopify_id!(VariantId, "ProductVariant");
define_shopify_id!(InventoryItemId, "InventoryItem");
define_shopify_id!(OrderId, "Order");
