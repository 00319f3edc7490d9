//! Reward Sync Core - Shared types library.
//!
//! This crate provides the types and pure logic shared by all Reward Sync
//! components:
//! - `admin` - Admin UI, webhook receiver and sync services
//! - `cli` - Command-line tools for migrations and manual syncs
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for local and Shopify IDs, customer tiers
//! - [`reward`] - Margin-based reward calculation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod reward;
pub mod types;

pub use reward::{GrossMargins, RewardAmounts, RewardError, calculate_rewards};
pub use types::*;
