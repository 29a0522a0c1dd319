//! Payment gateway errors.

use thiserror::Error;

/// Errors that can occur when calling the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (network, timeout, TLS).
    #[error("gateway request failed: {0}")]
    Request(String),

    /// Gateway returned a non-success status.
    #[error("gateway API error ({status}): {body}")]
    Api {
        /// HTTP status code from the gateway.
        status: u16,
        /// Raw response body, for logs and the gateway snapshot.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("gateway response error: {0}")]
    Response(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}
