//! Manual sync pipeline.

#![allow(clippy::unwrap_used)]

use reward_sync_admin::services::{CategoryForm, CategoryService, SyncService};
use reward_sync_core::{CollectionId, ProductId, RewardAmounts, VariantId};
use reward_sync_integration_tests::{FakeShopify, MemoryStore, variant};
use rust_decimal_macros::dec;

async fn create_category(store: &MemoryStore, shopify: &FakeShopify, name: &str) {
    CategoryService::new(store, shopify)
        .create(&CategoryForm {
            name: name.to_string(),
            elite_gross_margin: "50".to_string(),
            regular_gross_margin: "20".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sync_computes_reference_rewards() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![variant(1001, dec!(100), Some(dec!(60)))],
    );
    create_category(&store, &shopify, "Shoes").await;

    let report = SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.collections, 1);
    assert_eq!(report.products, 1);
    assert_eq!(report.variants, 1);

    let stored = store.variant(VariantId::new(1001)).unwrap();
    assert_eq!(stored.product_id, ProductId::new(101));
    assert_eq!(stored.unit_cost, dec!(60));
    assert_eq!(stored.elite_reward, dec!(20.00));
    assert_eq!(stored.regular_reward, dec!(8.00));

    assert_eq!(
        shopify.written_rewards(1001),
        Some(RewardAmounts::new(dec!(20.00), dec!(8.00)))
    );
    assert_eq!(
        shopify.metafield_values(1001),
        vec![
            ("elite_reward".to_string(), "20".to_string()),
            ("regular_reward".to_string(), "8".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![
            variant(1001, dec!(100), Some(dec!(60))),
            variant(1002, dec!(59.99), None),
        ],
    );
    create_category(&store, &shopify, "Shoes").await;
    let service = SyncService::new(&store, &shopify);

    let first = service.run(&[]).await.unwrap();
    let products = store.products();
    let variants = [
        store.variant(VariantId::new(1001)),
        store.variant(VariantId::new(1002)),
    ];

    let second = service.run(&[]).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.products(), products);
    assert_eq!(
        [
            store.variant(VariantId::new(1001)),
            store.variant(VariantId::new(1002)),
        ],
        variants
    );
    assert_eq!(store.variant_count(), 2);
}

#[tokio::test]
async fn test_missing_cost_counts_as_zero() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(shoes, 101, "Runner", vec![variant(1001, dec!(30), None)]);
    create_category(&store, &shopify, "Shoes").await;

    SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    let stored = store.variant(VariantId::new(1001)).unwrap();
    assert_eq!(stored.unit_cost, dec!(0));
    assert_eq!(stored.elite_reward, dec!(50.00));
    assert_eq!(stored.regular_reward, dec!(20.00));
}

#[tokio::test]
async fn test_metafield_failure_does_not_stop_other_variants() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![
            variant(1001, dec!(100), Some(dec!(60))),
            variant(1002, dec!(100), Some(dec!(50))),
        ],
    );
    shopify.add_product(
        shoes,
        102,
        "Trail",
        vec![variant(1003, dec!(200), Some(dec!(100)))],
    );
    create_category(&store, &shopify, "Shoes").await;
    shopify.fail_writes_for(1001);

    let report = SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.metafield_failures, 1);
    assert_eq!(report.variants, 3);
    assert_eq!(shopify.written_rewards(1001), None);
    assert_eq!(
        shopify.written_rewards(1002),
        Some(RewardAmounts::new(dec!(25.00), dec!(10.00)))
    );
    assert!(shopify.written_rewards(1003).is_some());
    assert!(store.variant(VariantId::new(1001)).is_some());
}

#[tokio::test]
async fn test_zero_price_variant_is_skipped() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Sample",
        vec![
            variant(1001, dec!(0), Some(dec!(5))),
            variant(1002, dec!(10), Some(dec!(5))),
        ],
    );
    create_category(&store, &shopify, "Shoes").await;

    let report = SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    assert_eq!(report.variants_skipped, 1);
    assert_eq!(report.variants, 1);
    assert_eq!(store.variant(VariantId::new(1001)), None);
    assert_eq!(shopify.written_rewards(1001), None);
}

#[tokio::test]
async fn test_sync_backfills_category_collections() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    create_category(&store, &shopify, "Shoes").await;

    let shoes = shopify.add_collection(9, "shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![variant(1001, dec!(100), Some(dec!(60)))],
    );

    let report = SyncService::new(&store, &shopify).run(&[]).await.unwrap();

    assert_eq!(report.categories_matched, 1);
    assert_eq!(report.collections, 1);
    assert!(store.variant(VariantId::new(1001)).is_some());
}

#[tokio::test]
async fn test_sync_selected_collection_without_category_uses_zero_margins() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let misc = shopify.add_collection(5, "Misc");
    shopify.add_product(
        misc,
        301,
        "Sticker",
        vec![variant(3001, dec!(4), Some(dec!(1)))],
    );

    let report = SyncService::new(&store, &shopify)
        .run(&[misc, misc])
        .await
        .unwrap();

    assert_eq!(report.collections, 1);
    assert_eq!(
        shopify.written_rewards(3001),
        Some(RewardAmounts::ZERO)
    );
}

#[tokio::test]
async fn test_unknown_collection_is_counted_and_skipped() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();

    let report = SyncService::new(&store, &shopify)
        .run(&[CollectionId::new(404)])
        .await
        .unwrap();

    assert_eq!(report.collections_failed, 1);
    assert_eq!(report.collections, 0);
}

#[tokio::test]
async fn test_requested_collections_sync_when_collection_list_fails() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    shopify.add_product(
        shoes,
        101,
        "Runner",
        vec![variant(1001, dec!(100), Some(dec!(60)))],
    );
    create_category(&store, &shopify, "Shoes").await;
    shopify.fail_collections();

    let report = SyncService::new(&store, &shopify)
        .run(&[shoes])
        .await
        .unwrap();

    assert!(report.backfill_failed);
    assert_eq!(report.categories_matched, 0);
    assert!(!report.is_clean());
    assert_eq!(report.collections, 1);
    assert_eq!(report.variants, 1);
    assert_eq!(
        shopify.written_rewards(1001),
        Some(RewardAmounts::new(dec!(20.00), dec!(8.00)))
    );
}
