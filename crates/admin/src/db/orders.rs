//! Order repository for database operations.

use chrono::{DateTime, Utc};
use reward_sync_core::{CustomerTier, OrderId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{NewOrder, Order};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    name: String,
    elite_reward: Decimal,
    regular_reward: Decimal,
    customer_type: CustomerTier,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            name: row.name,
            elite_reward: row.elite_reward,
            regular_reward: row.regular_reward,
            customer_type: row.customer_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order, or overwrite it when the webhook is redelivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO rewards."order"
                (id, name, elite_reward, regular_reward, customer_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                elite_reward = EXCLUDED.elite_reward,
                regular_reward = EXCLUDED.regular_reward,
                customer_type = EXCLUDED.customer_type,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            RETURNING id, name, elite_reward, regular_reward, customer_type,
                      created_at, updated_at
            "#,
        )
        .bind(order.id)
        .bind(&order.name)
        .bind(order.rewards.elite)
        .bind(order.rewards.regular)
        .bind(order.customer_type)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// The most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, name, elite_reward, regular_reward, customer_type,
                   created_at, updated_at
            FROM rewards."order"
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
