//! Manual product sync.
//!
//! Runs the same pipeline as the admin page's "Sync Products" button.
//!
//! # Usage
//!
//! ```bash
//! # Sync every category that has a collection
//! rs-cli sync
//!
//! # Sync specific collections
//! rs-cli sync -c 441234567890 -c gid://shopify/Collection/441234567891
//! ```

use reward_sync_admin::config::{AdminConfig, ConfigError};
use reward_sync_admin::db::{self, PgRewardStore};
use reward_sync_admin::error::AppError;
use reward_sync_admin::services::SyncService;
use reward_sync_admin::shopify::AdminClient;
use reward_sync_core::CollectionId;
use thiserror::Error;

/// Errors that can occur during a manual sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A collection argument is neither a number nor a collection GID.
    #[error("Invalid collection id: {0}")]
    InvalidCollection(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// The sync aborted.
    #[error(transparent)]
    Sync(#[from] AppError),
}

/// Run the sync for `collections` (all paired collections when empty).
///
/// # Errors
///
/// Returns `SyncError` if configuration is missing, a collection argument is
/// malformed, or the sync aborts on a database or collection-list failure.
pub async fn run(collections: &[String]) -> Result<(), SyncError> {
    let collection_ids = parse_collection_ids(collections)?;

    let config = AdminConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let store = PgRewardStore::new(pool);
    let shopify = AdminClient::new(&config.shopify);

    tracing::info!(
        store = %config.shopify.store,
        collections = collection_ids.len(),
        "Starting sync"
    );

    let report = SyncService::new(&store, &shopify)
        .run(&collection_ids)
        .await?;

    if report.is_clean() {
        tracing::info!("{report}");
    } else {
        tracing::warn!("{report}");
    }
    Ok(())
}

fn parse_collection_ids(values: &[String]) -> Result<Vec<CollectionId>, SyncError> {
    values
        .iter()
        .map(|value| {
            value
                .parse::<CollectionId>()
                .or_else(|_| CollectionId::from_gid(value.trim()))
                .map_err(|_| SyncError::InvalidCollection(value.clone()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_ids() {
        let ids = parse_collection_ids(&[
            "12".to_string(),
            "gid://shopify/Collection/34".to_string(),
        ])
        .unwrap();
        assert_eq!(ids, vec![CollectionId::new(12), CollectionId::new(34)]);
    }

    #[test]
    fn test_parse_collection_ids_rejects_other_resources() {
        let err = parse_collection_ids(&["gid://shopify/Product/34".to_string()]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidCollection(_)));
    }
}
