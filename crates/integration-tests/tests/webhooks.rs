//! Webhook processing against the in-memory store and shop.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reward_sync_admin::db::RewardStore;
use reward_sync_admin::error::AppError;
use reward_sync_admin::models::Product;
use reward_sync_admin::services::{
    CategoryForm, CategoryService, OrderPayload, ProductPayload, RewardNotification,
    WebhookService, spawn_notification,
};
use reward_sync_core::{CollectionId, CustomerTier, OrderId, ProductId, VariantId};
use reward_sync_integration_tests::{FakeNotifier, FakeShopify, MemoryStore, variant};
use rust_decimal_macros::dec;
use serde_json::json;

async fn store_product(store: &MemoryStore, id: i64) {
    store
        .upsert_product(&Product {
            id: ProductId::new(id),
            title: "Runner".to_string(),
            collection_id: Some(CollectionId::new(1)),
        })
        .await
        .unwrap();
}

fn order_payload(tags: serde_json::Value, variant_ids: &[Option<i64>]) -> OrderPayload {
    let line_items: Vec<_> = variant_ids
        .iter()
        .enumerate()
        .map(|(i, id)| json!({ "id": i, "variant_id": id, "quantity": 1 }))
        .collect();
    serde_json::from_value(json!({
        "id": 5_001_234_567_i64,
        "name": "#1001",
        "created_at": "2024-10-20T10:00:00Z",
        "updated_at": "2024-10-20T10:05:00Z",
        "customer": { "id": 42, "tags": tags },
        "line_items": line_items,
        "current_total_price_set": {
            "shop_money": { "amount": "180.00", "currency_code": "USD" }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_order_sums_line_item_rewards() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    store_product(&store, 101).await;
    shopify.set_metafields(1001, 101, "5.00", "2.00");
    shopify.set_metafields(1002, 101, "3.00", "1.50");

    let processed = WebhookService::new(&store, &shopify)
        .process_order(&order_payload(json!("vip, Elite"), &[Some(1001), Some(1002), None]))
        .await
        .unwrap();

    assert_eq!(processed.order.elite_reward, dec!(8.00));
    assert_eq!(processed.order.regular_reward, dec!(3.50));
    assert_eq!(processed.order.customer_type, CustomerTier::Elite);

    let stored = store.order(OrderId::new(5_001_234_567)).unwrap();
    assert_eq!(stored, processed.order);
    assert_eq!(stored.name, "#1001");

    assert_eq!(
        processed.notification,
        RewardNotification::new(OrderId::new(5_001_234_567), dec!(8.00), Some("USD".into()))
    );
}

#[tokio::test]
async fn test_regular_customer_is_notified_with_regular_reward() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    store_product(&store, 101).await;
    shopify.set_metafields(1001, 101, "5.00", "2.00");

    let processed = WebhookService::new(&store, &shopify)
        .process_order(&order_payload(json!(["wholesale"]), &[Some(1001)]))
        .await
        .unwrap();

    assert_eq!(processed.order.customer_type, CustomerTier::Regular);

    let notifier = FakeNotifier::new();
    spawn_notification(notifier.clone(), processed.notification)
        .await
        .unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].orderid, "5001234567");
    assert_eq!(sent[0].price, dec!(2.00));
}

#[tokio::test]
async fn test_non_numeric_metafields_are_ignored() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    store_product(&store, 101).await;
    shopify.set_metafields(1001, 101, "n/a", "2.00");
    shopify.set_metafields(1002, 101, "4", "");

    let processed = WebhookService::new(&store, &shopify)
        .process_order(&order_payload(json!("elite"), &[Some(1001), Some(1002)]))
        .await
        .unwrap();

    assert_eq!(processed.order.elite_reward, dec!(4));
    assert_eq!(processed.order.regular_reward, dec!(2.00));
}

#[tokio::test]
async fn test_variant_unknown_to_shopify_is_skipped() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    store_product(&store, 101).await;
    shopify.set_metafields(1001, 101, "5.00", "2.00");

    let processed = WebhookService::new(&store, &shopify)
        .process_order(&order_payload(json!(""), &[Some(1001), Some(9999)]))
        .await
        .unwrap();

    assert_eq!(processed.order.elite_reward, dec!(5.00));
}

#[tokio::test]
async fn test_order_for_unknown_product_is_not_found_and_not_stored() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    shopify.set_metafields(1001, 777, "5.00", "2.00");

    let err = WebhookService::new(&store, &shopify)
        .process_order(&order_payload(json!("elite"), &[Some(1001)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(store.order(OrderId::new(5_001_234_567)), None);
}

#[tokio::test]
async fn test_redelivered_order_is_upserted() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    store_product(&store, 101).await;
    shopify.set_metafields(1001, 101, "5.00", "2.00");
    let service = WebhookService::new(&store, &shopify);
    let payload = order_payload(json!("elite"), &[Some(1001)]);

    service.process_order(&payload).await.unwrap();
    service.process_order(&payload).await.unwrap();

    let orders = store.list_orders(10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].elite_reward, dec!(5.00));
}

#[tokio::test]
async fn test_product_created_in_category_collection_gets_rewards() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let shoes = shopify.add_collection(1, "Shoes");
    CategoryService::new(&store, &shopify)
        .create(&CategoryForm {
            name: "Shoes".to_string(),
            elite_gross_margin: "50".to_string(),
            regular_gross_margin: "20".to_string(),
        })
        .await
        .unwrap();
    shopify.add_product(
        shoes,
        202,
        "Sandal",
        vec![variant(2001, dec!(50), Some(dec!(25)))],
    );

    let payload: ProductPayload = serde_json::from_value(json!({
        "id": 202,
        "title": "Sandal",
        "variants": [
            { "id": 2001, "price": "50.00", "inventory_item_id": 2001 }
        ]
    }))
    .unwrap();

    let report = WebhookService::new(&store, &shopify)
        .process_product_created(&payload)
        .await
        .unwrap();

    assert_eq!(report.collections, 1);
    assert_eq!(report.variants, 1);

    let stored = store.variant(VariantId::new(2001)).unwrap();
    assert_eq!(stored.unit_cost, dec!(25));
    assert_eq!(stored.elite_reward, dec!(25.00));
    assert_eq!(stored.regular_reward, dec!(10.00));
    assert_eq!(shopify.metafield_values(2001)[0].1, "25");
}

#[tokio::test]
async fn test_product_created_outside_categories_is_ignored() {
    let store = MemoryStore::new();
    let shopify = FakeShopify::new();
    let misc = shopify.add_collection(5, "Misc");
    shopify.add_product(misc, 303, "Sticker", vec![variant(3001, dec!(4), None)]);

    let payload: ProductPayload = serde_json::from_value(json!({
        "id": 303,
        "title": "Sticker",
        "variants": [{ "id": 3001, "price": "4.00", "inventory_item_id": null }]
    }))
    .unwrap();

    let report = WebhookService::new(&store, &shopify)
        .process_product_created(&payload)
        .await
        .unwrap();

    assert_eq!(report.collections, 0);
    assert!(store.products().is_empty());
    assert!(shopify.writes().is_empty());
}
