//! Shopify webhook receivers.
//!
//! Every delivery is authenticated with the `X-Shopify-Hmac-Sha256` header:
//! a base64 HMAC-SHA256 of the raw body keyed with the app's API secret.
//!
//! Status codes tell Shopify whether to redeliver: 2xx and 4xx end the
//! delivery, 5xx schedules a retry. Only a bad signature (401) and an order
//! for a product that is not stored locally (404) end a failed delivery;
//! everything else, malformed payloads included, answers 500.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{info, instrument};

use crate::{
    error::AppError,
    services::{OrderPayload, ProductPayload, WebhookService, spawn_notification},
    state::AppState,
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";
/// Header carrying the webhook topic (e.g. `orders/create`).
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";
/// Header carrying the sending shop's domain.
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Check a webhook signature against the raw body.
///
/// The comparison is constant-time.
#[must_use]
pub fn verify_hmac(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64_STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// `POST /webhooks/orders/create`
#[instrument(skip_all)]
pub async fn orders_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(handle_order(&state, &headers, &body).await)
}

/// `POST /webhooks/products/create`
#[instrument(skip_all)]
pub async fn products_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(handle_product_created(&state, &headers, &body).await)
}

/// `POST /webhooks/products/update`
///
/// Acknowledged without processing; rewards are recomputed by a manual sync.
#[instrument(skip_all)]
pub async fn products_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(authenticate(&state, &headers, &body).map(|()| "ok"))
}

async fn handle_order(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<&'static str, AppError> {
    authenticate(state, headers, body)?;
    let payload: OrderPayload = parse_payload(body)?;

    let processed = WebhookService::new(state.store(), state.shopify())
        .process_order(&payload)
        .await?;

    spawn_notification(state.rewards_api().clone(), processed.notification);
    Ok("ok")
}

async fn handle_product_created(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<&'static str, AppError> {
    authenticate(state, headers, body)?;
    let payload: ProductPayload = parse_payload(body)?;

    WebhookService::new(state.store(), state.shopify())
        .process_product_created(&payload)
        .await?;
    Ok("ok")
}

/// Verify the signature and log the delivery.
fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let topic = header_str(headers, TOPIC_HEADER);
    let shop = header_str(headers, SHOP_DOMAIN_HEADER);

    let signature = headers
        .get(HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    let secret = state.config().shopify.api_secret.expose_secret();
    if !verify_hmac(secret.as_bytes(), body, signature) {
        return Err(AppError::Unauthorized(
            "invalid webhook signature".to_string(),
        ));
    }

    info!(topic, shop, bytes = body.len(), "Webhook received");
    Ok(())
}

fn parse_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Webhook status for an error.
#[must_use]
pub const fn webhook_status(err: &AppError) -> StatusCode {
    match err {
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond(result: Result<&'static str, AppError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            err.report();
            (webhook_status(&err), err.public_message()).into_response()
        }
    }
}
