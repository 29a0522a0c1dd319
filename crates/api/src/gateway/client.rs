//! Payment gateway HTTP client.
//!
//! Authenticates with HTTP basic auth (key id / key secret) and exchanges
//! JSON bodies. Every call returns both the typed response and the raw JSON
//! value so callers can persist the untouched snapshot.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::instrument;

use crate::config::GatewayConfig;

use super::error::GatewayError;
use super::types::{GatewayOrder, GatewayPayment, GatewayRefund};

/// Payment gateway API client.
#[derive(Clone)]
pub struct GatewayClient {
    /// HTTP client.
    client: Client,
    /// Gateway API base URL.
    base_url: String,
    /// API key id (basic-auth username).
    key_id: String,
    /// API key secret (basic-auth password).
    key_secret: SecretString,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a new gateway client from configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }

    /// Create a remote payment intent for an order.
    ///
    /// `amount_minor` is in the smallest currency unit. `receipt` carries the
    /// merchant order number; `notes` carries local ids for reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the response cannot be
    /// decoded.
    #[instrument(skip(self, notes))]
    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
        notes: Value,
    ) -> Result<(GatewayOrder, Value), GatewayError> {
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
            "notes": notes,
        });

        let raw = self.post("/orders", &body).await?;
        let order: GatewayOrder = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        Ok((order, raw))
    }

    /// Fetch a payment's current state directly from the gateway.
    ///
    /// Verification never trusts the client callback alone; this is the
    /// authoritative read.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the response cannot be
    /// decoded.
    #[instrument(skip(self))]
    pub async fn fetch_payment(
        &self,
        payment_id: &str,
    ) -> Result<(GatewayPayment, Value), GatewayError> {
        let raw = self.get(&format!("/payments/{payment_id}")).await?;
        let payment: GatewayPayment = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        Ok((payment, raw))
    }

    /// Refund a captured payment, fully (no amount) or partially.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the response cannot be
    /// decoded.
    #[instrument(skip(self))]
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        amount_minor: Option<i64>,
        reason: Option<&str>,
    ) -> Result<(GatewayRefund, Value), GatewayError> {
        let mut body = json!({
            "notes": { "reason": reason.unwrap_or("Customer request") },
        });
        if let Some(amount) = amount_minor
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert("amount".to_string(), json!(amount));
        }

        let raw = self
            .post(&format!("/payments/{payment_id}/refund"), &body)
            .await?;
        let refund: GatewayRefund = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        Ok((refund, raw))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "gateway call failed");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        Ok(raw)
    }
}
