//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness (main.rs)
//! GET  /health/ready                - Database readiness (main.rs)
//!
//! # Admin UI
//! GET  /                            - Redirect to /categories
//! GET  /categories                  - Category table and recent orders
//! POST /categories                  - Form intents: create, update, delete, syncProduct
//!
//! # Shopify webhooks (HMAC verified)
//! POST /webhooks/orders/create      - Store order rewards, notify rewards API
//! POST /webhooks/products/create    - Compute rewards for a new product
//! POST /webhooks/products/update    - Acknowledged, not processed
//! ```

pub mod categories;
pub mod webhooks;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the application router (without health checks and layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/categories") }))
        .route(
            "/categories",
            get(categories::index).post(categories::submit),
        )
        .route("/webhooks/orders/create", post(webhooks::orders_create))
        .route("/webhooks/products/create", post(webhooks::products_create))
        .route("/webhooks/products/update", post(webhooks::products_update))
}
