//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::PgRewardStore;
use crate::services::RewardsApiClient;
use crate::shopify::AdminClient;

/// Application state shared across all handlers.
///
/// Cheap to clone; every clone points at the same inner state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: PgRewardStore,
    shopify: AdminClient,
    rewards_api: RewardsApiClient,
}

impl AppState {
    /// Build the state from configuration and a database pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let shopify = AdminClient::new(&config.shopify);
        let rewards_api = RewardsApiClient::new(&config.rewards_api);
        Self::from_parts(config, PgRewardStore::new(pool), shopify, rewards_api)
    }

    /// Build the state from already constructed clients.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        store: PgRewardStore,
        shopify: AdminClient,
        rewards_api: RewardsApiClient,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                shopify,
                rewards_api,
            }),
        }
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Database-backed store.
    #[must_use]
    pub fn store(&self) -> &PgRewardStore {
        &self.inner.store
    }

    /// Raw connection pool (health checks).
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }

    /// Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    /// Rewards API client.
    #[must_use]
    pub fn rewards_api(&self) -> &RewardsApiClient {
        &self.inner.rewards_api
    }
}
