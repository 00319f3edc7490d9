//! Order domain types.

use chrono::{DateTime, Utc};
use reward_sync_core::{CustomerTier, OrderId, RewardAmounts};
use rust_decimal::Decimal;
use serde::Serialize;

/// An order received through the `orders/create` webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Shopify order ID.
    pub id: OrderId,
    /// Order name as shown in Shopify (e.g. `#1001`).
    pub name: String,
    /// Summed elite rewards of the line items.
    pub elite_reward: Decimal,
    /// Summed regular rewards of the line items.
    pub regular_reward: Decimal,
    /// Tier of the customer who placed the order.
    pub customer_type: CustomerTier,
    /// Shopify creation time.
    pub created_at: DateTime<Utc>,
    /// Shopify update time.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The reward owed to this order's customer.
    #[must_use]
    pub const fn customer_reward(&self) -> Decimal {
        match self.customer_type {
            CustomerTier::Elite => self.elite_reward,
            CustomerTier::Regular => self.regular_reward,
        }
    }
}

/// Fields for upserting an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Shopify order ID.
    pub id: OrderId,
    /// Order name.
    pub name: String,
    /// Summed rewards.
    pub rewards: RewardAmounts,
    /// Customer tier.
    pub customer_type: CustomerTier,
    /// Shopify creation time.
    pub created_at: DateTime<Utc>,
    /// Shopify update time.
    pub updated_at: DateTime<Utc>,
}
