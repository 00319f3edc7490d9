//! Category CRUD against the in-memory store and shop.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reward_sync_admin::db::{RepositoryError, RewardStore};
use reward_sync_admin::error::AppError;
use reward_sync_admin::services::{CategoryForm, CategoryService, SyncService};
use reward_sync_core::{CollectionId, RewardAmounts, VariantId};
use reward_sync_integration_tests::{FakeShopify, MemoryStore, variant};
use rust_decimal_macros::dec;

fn form(name: &str, elite: &str, regular: &str) -> CategoryForm {
    CategoryForm {
        name: name.to_string(),
        elite_gross_margin: elite.to_string(),
        regular_gross_margin: regular.to_string(),
    }
}

/// A shop with one collection holding one product with two variants.
fn shoe_shop() -> FakeShopify {
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![
            variant(1001, dec!(100.00), Some(dec!(60.00))),
            variant(1002, dec!(80.00), Some(dec!(40.00))),
        ],
    );
    shopify
}

#[tokio::test]
async fn test_create_matches_collection_case_insensitively() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();

    let category = CategoryService::new(&store, &shopify)
        .create(&form("  sHoEs ", "50", "20"))
        .await
        .unwrap();

    assert_eq!(category.name, "sHoEs");
    assert_eq!(category.collection_id, Some(CollectionId::new(1)));
    assert_eq!(category.elite_gross_margin, dec!(50));
}

#[tokio::test]
async fn test_create_without_matching_collection_leaves_it_null() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();

    let category = CategoryService::new(&store, &shopify)
        .create(&form("Hats", "10", "5"))
        .await
        .unwrap();

    assert_eq!(category.collection_id, None);
}

#[tokio::test]
async fn test_create_backfills_existing_categories() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let service = CategoryService::new(&store, &shopify);

    service.create(&form("Hats", "10", "5")).await.unwrap();
    let hats = shopify.add_collection(7, "HATS");

    service.create(&form("Shoes", "50", "20")).await.unwrap();

    let categories = service.list().await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hats", "Shoes"]);
    assert_eq!(categories[0].collection_id, Some(hats));
}

#[tokio::test]
async fn test_non_numeric_margin_fails_before_any_call() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();

    let err = CategoryService::new(&store, &shopify)
        .create(&form("Shoes", "fifty", "20"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.status(), 400);
    assert_eq!(store.writes(), 0);
    assert_eq!(shopify.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    service.create(&form("Hats", "10", "5")).await.unwrap();
    let err = service.create(&form("Hats", "20", "5")).await.unwrap_err();

    assert_eq!(err.status(), 409);
}

#[tokio::test]
async fn test_collection_can_only_be_paired_once() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    let shoes = service.create(&form("Shoes", "50", "20")).await.unwrap();
    let hats = service.create(&form("Hats", "10", "5")).await.unwrap();
    assert_eq!(shoes.collection_id, Some(CollectionId::new(1)));

    let err = store
        .set_category_collection(hats.id, CollectionId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    store
        .set_category_collection(shoes.id, CollectionId::new(1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_resets_metafields_and_removes_rows() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    let category = service.create(&form("Shoes", "50", "20")).await.unwrap();
    SyncService::new(&store, &shopify).run(&[]).await.unwrap();
    assert_eq!(store.variant_count(), 2);

    let outcome = service.delete(category.id).await.unwrap();

    assert_eq!(outcome.products, 1);
    assert_eq!(outcome.variants, 2);
    assert_eq!(outcome.reset_failures, 0);
    assert!(store.products().is_empty());
    assert_eq!(store.variant_count(), 0);
    assert!(service.list().await.unwrap().is_empty());

    for variant_id in [1001, 1002] {
        assert_eq!(shopify.written_rewards(variant_id), Some(RewardAmounts::ZERO));
        assert_eq!(
            shopify.metafield_values(variant_id),
            vec![
                ("elite_reward".to_string(), "0".to_string()),
                ("regular_reward".to_string(), "0".to_string()),
            ]
        );
    }
}

#[tokio::test]
async fn test_delete_succeeds_when_metafield_reset_fails() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    let category = service.create(&form("Shoes", "50", "20")).await.unwrap();
    SyncService::new(&store, &shopify).run(&[]).await.unwrap();
    shopify.fail_writes_for(1001);

    let outcome = service.delete(category.id).await.unwrap();

    assert_eq!(outcome.reset_failures, 1);
    assert_eq!(store.variant_count(), 0);
}

#[tokio::test]
async fn test_delete_unknown_category_is_not_found() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();

    let err = CategoryService::new(&store, &shopify)
        .delete(reward_sync_core::CategoryId::new(99))
        .await
        .unwrap_err();

    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_update_to_unmatched_name_detaches_collection() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    let category = service.create(&form("Shoes", "50", "20")).await.unwrap();
    SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    let updated = service
        .update(category.id, &form("Sneakers", "40", "10"))
        .await
        .unwrap();

    assert_eq!(updated.collection_id, None);
    assert_eq!(updated.elite_gross_margin, dec!(40));
    assert!(store.products().is_empty());
    assert_eq!(store.variant(VariantId::new(1001)), None);
    assert_eq!(shopify.written_rewards(1002), Some(RewardAmounts::ZERO));
}

#[tokio::test]
async fn test_update_keeps_stored_rewards_until_next_sync() {
    let store = MemoryStore::new();
    let shopify = shoe_shop();
    let service = CategoryService::new(&store, &shopify);

    let category = service.create(&form("Shoes", "50", "20")).await.unwrap();
    SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    let updated = service
        .update(category.id, &form("Shoes", "25", "10"))
        .await
        .unwrap();
    assert_eq!(updated.collection_id, Some(CollectionId::new(1)));

    let stale = store.variant(VariantId::new(1001)).unwrap();
    assert_eq!(stale.elite_reward, dec!(20.00));

    SyncService::new(&store, &shopify).run(&[]).await.unwrap();
    let fresh = store.variant(VariantId::new(1001)).unwrap();
    assert_eq!(fresh.elite_reward, dec!(10.00));
    assert_eq!(fresh.regular_reward, dec!(4.00));
}
