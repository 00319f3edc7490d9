//! Reward Sync Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Modules
//!
//! - [`services`] - Category CRUD, collection/product sync, webhook processing
//! - [`shopify`] - Shopify Admin GraphQL client
//! - [`db`] - `PostgreSQL` store for categories, products, variants and orders
//! - [`routes`] - Admin page and webhook handlers
//!
//! # Security
//!
//! This crate holds a Shopify Admin API token that can write product
//! metafields. Webhooks are accepted only with a valid HMAC signature.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
