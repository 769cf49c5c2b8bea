//! HTTP client for the commerce services behind the service gateway.
//!
//! Paths are relative to the gateway base URL (`http://localhost:8000/api`):
//!
//! | Operation | Request |
//! |---|---|
//! | list / get inventory | `GET inventory/`, `GET inventory/{id}` |
//! | adjust inventory | `PUT inventory/{id}/stock {quantity}` |
//! | create / get order | `POST orders/`, `GET orders/{id}` |
//! | create return | `POST returns/` |
//! | charge / refund | `POST payments/charge`, `POST payments/refund` |
//! | support case | `POST salesforce/cases` |
//!
//! Status mapping: 404 → `NotFound`, 400/409/422 → `Validation`,
//! 402 → `Declined`, anything else (and every transport fault) → `Unavailable`.

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::BackendConfig;
use concierge_core::backend::*;
use concierge_core::error::BackendError;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub struct HttpBackend {
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Backend client setup failed, timing out per request instead");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            timeout,
            client,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let mut backend = Self::new(&config.base_url, config.timeout());
        backend.auth_token = config.auth_token.clone();
        backend
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attach the bearer token, if any, and the per-call timeout.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.timeout(self.timeout);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode a JSON body, mapping failures onto [`BackendError`].
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        entity: &str,
        id: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                warn!(entity, error = %e, "Backend call failed");
                BackendError::Unavailable(e.to_string())
            })?;

        let status = response.status().as_u16();
        debug!(entity, id, status, "Backend responded");

        match status {
            200..=299 => response
                .json::<T>()
                .await
                .map_err(|e| BackendError::Unavailable(format!("malformed {entity} response: {e}"))),
            404 => Err(BackendError::not_found(entity, id)),
            400 | 409 | 422 => Err(BackendError::Validation(response.text().await.unwrap_or_default())),
            402 => Err(BackendError::Declined(response.text().await.unwrap_or_default())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(entity, status, body = %body, "Backend returned error");
                Err(BackendError::Unavailable(format!("{entity} service returned {status}")))
            }
        }
    }
}

#[async_trait]
impl CommerceBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn get_inventory(&self, product_id: i64) -> Result<InventoryItem, BackendError> {
        let id = product_id.to_string();
        self.send(self.client.get(self.url(&format!("inventory/{id}"))), "product", &id)
            .await
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, BackendError> {
        self.send(self.client.get(self.url("inventory/")), "inventory", "")
            .await
    }

    async fn adjust_inventory(&self, product_id: i64, delta: i64) -> Result<InventoryItem, BackendError> {
        let id = product_id.to_string();
        let request = self
            .client
            .put(self.url(&format!("inventory/{id}/stock")))
            .json(&serde_json::json!({ "quantity": delta }));
        self.send(request, "product", &id).await
    }

    async fn charge_payment(&self, amount: f64, customer_id: &str) -> Result<Charge, BackendError> {
        let request = self
            .client
            .post(self.url("payments/charge"))
            .json(&serde_json::json!({ "amount": amount, "customer_id": customer_id }));
        self.send(request, "customer", customer_id).await
    }

    async fn refund_payment(&self, charge_id: &str) -> Result<Refund, BackendError> {
        let request = self
            .client
            .post(self.url("payments/refund"))
            .json(&serde_json::json!({ "charge_id": charge_id }));
        self.send(request, "charge", charge_id).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, BackendError> {
        let request = self.client.post(self.url("orders/")).json(&order);
        self.send(request, "order", "").await
    }

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord, BackendError> {
        let id = order_id.to_string();
        self.send(self.client.get(self.url(&format!("orders/{id}"))), "order", &id)
            .await
    }

    async fn create_return(&self, request: NewReturn) -> Result<ReturnRecord, BackendError> {
        let id = request.order_id.to_string();
        let http = self.client.post(self.url("returns/")).json(&request);
        self.send(http, "order", &id).await
    }

    async fn create_support_case(&self, case: NewSupportCase) -> Result<SupportCase, BackendError> {
        let request = self.client.post(self.url("salesforce/cases")).json(&case);
        self.send(request, "case", "").await
    }
}
