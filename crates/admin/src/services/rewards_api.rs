//! Client for the external rewards endpoint.
//!
//! Every processed order is reported as
//! `POST {base}/ShopifyOrder/CreateReward` with the reward owed to the
//! customer. Delivery is fire-and-forget: failures are logged, never retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reward_sync_core::OrderId;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, instrument, warn};

use crate::config::RewardsApiConfig;

/// Path of the create-reward endpoint, relative to the base URL.
const CREATE_REWARD_PATH: &str = "/ShopifyOrder/CreateReward";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when calling the rewards API.
#[derive(Debug, Error)]
pub enum RewardsApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body could not be encoded.
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

/// Body of a create-reward request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardNotification {
    /// Shopify order ID as a string.
    pub orderid: String,
    /// Reward for the customer's tier.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Shop currency of the order.
    pub currency: Option<String>,
}

impl RewardNotification {
    /// Build a notification for an order.
    #[must_use]
    pub fn new(order_id: OrderId, price: Decimal, currency: Option<String>) -> Self {
        Self {
            orderid: order_id.to_string(),
            price,
            currency,
        }
    }
}

/// Sends reward notifications for processed orders.
pub trait RewardNotifier: Send + Sync {
    /// Deliver one notification.
    fn notify(
        &self,
        notification: &RewardNotification,
    ) -> impl Future<Output = Result<(), RewardsApiError>> + Send;
}

/// Deliver a notification in the background.
///
/// Errors are logged. The returned handle may be awaited (tests do) or
/// dropped.
pub fn spawn_notification<N>(notifier: N, notification: RewardNotification) -> JoinHandle<()>
where
    N: RewardNotifier + 'static,
{
    let span = info_span!("reward_notification", order_id = %notification.orderid);
    tokio::spawn(
        async move {
            if let Err(e) = notifier.notify(&notification).await {
                warn!(error = %e, "Failed to send reward notification");
            }
        }
        .instrument(span),
    )
}

/// HTTP client for the rewards API.
#[derive(Clone)]
pub struct RewardsApiClient {
    inner: Arc<RewardsApiClientInner>,
}

struct RewardsApiClientInner {
    client: reqwest::Client,
    endpoint: String,
    token: SecretString,
}

impl std::fmt::Debug for RewardsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardsApiClient")
            .field("endpoint", &self.inner.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RewardsApiClient {
    /// Create a new rewards API client.
    #[must_use]
    pub fn new(config: &RewardsApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(RewardsApiClientInner {
                client,
                endpoint: format!("{}{CREATE_REWARD_PATH}", config.base_url),
                token: config.token.clone(),
            }),
        }
    }

    /// Full URL of the create-reward endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

impl RewardNotifier for RewardsApiClient {
    #[instrument(skip(self, notification), fields(order_id = %notification.orderid))]
    async fn notify(&self, notification: &RewardNotification) -> Result<(), RewardsApiError> {
        let body = serde_json::to_vec(notification)?;

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("accept", "/")
            .header("Content-Type", "application/json-patch+json")
            .header("token", self.inner.token.expose_secret())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(RewardsApiError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        info!(response = %text, "Reward API response");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> RewardsApiClient {
        RewardsApiClient::new(&RewardsApiConfig {
            base_url: server.uri(),
            token: SecretString::from("reward-token".to_string()),
        })
    }

    #[test]
    fn test_notification_json_shape() {
        let n = RewardNotification::new(OrderId::new(820_982), dec!(8.50), Some("USD".into()));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "orderid": "820982", "price": 8.5, "currency": "USD" })
        );
    }

    #[tokio::test]
    async fn test_notify_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ShopifyOrder/CreateReward"))
            .and(header("token", "reward-token"))
            .and(header("accept", "/"))
            .and(header("content-type", "application/json-patch+json"))
            .and(body_json(serde_json::json!({
                "orderid": "1001",
                "price": 20.0,
                "currency": "EUR"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .notify(&RewardNotification::new(
                OrderId::new(1001),
                dec!(20.00),
                Some("EUR".into()),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notify_reports_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .notify(&RewardNotification::new(OrderId::new(1), dec!(1), None))
            .await
            .unwrap_err();
        assert!(matches!(err, RewardsApiError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_spawn_notification_swallows_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        spawn_notification(
            client_for(&server),
            RewardNotification::new(OrderId::new(1), dec!(1), None),
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = RewardsApiClient::new(&RewardsApiConfig {
            base_url: "https://rewards.example.com".to_string(),
            token: SecretString::from("reward-token".to_string()),
        });
        let debug = format!("{client:?}");
        assert!(!debug.contains("reward-token"));
        assert_eq!(
            client.endpoint(),
            "https://rewards.example.com/ShopifyOrder/CreateReward"
        );
    }
}
