//! Payment gateway response types.
//!
//! Only the fields the payment flows consume are typed; the full response
//! body is carried alongside as a raw JSON snapshot.

use serde::{Deserialize, Serialize};

/// A remote payment intent ("gateway order").
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-issued order id.
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Merchant receipt reference (our order number).
    #[serde(default)]
    pub receipt: Option<String>,
    /// Gateway-side status string.
    #[serde(default)]
    pub status: Option<String>,
}

/// Gateway payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Created,
    Authorized,
    Captured,
    Refunded,
    Failed,
    /// Any status this client does not model.
    #[serde(other)]
    Unknown,
}

impl GatewayPaymentStatus {
    /// Whether funds have actually been captured.
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        matches!(self, Self::Captured)
    }
}

/// A payment as reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    /// Gateway-issued payment id.
    pub id: String,
    /// The gateway order this payment belongs to.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Current status.
    pub status: GatewayPaymentStatus,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

/// A refund as reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    /// Gateway-issued refund id.
    pub id: String,
    /// Refunded amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Gateway-side refund status string.
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_wire_format() {
        let status: GatewayPaymentStatus = serde_json::from_str("\"captured\"").unwrap();
        assert!(status.is_captured());

        let status: GatewayPaymentStatus = serde_json::from_str("\"authorized\"").unwrap();
        assert!(!status.is_captured());

        // Unmodelled statuses fall through instead of failing the decode
        let status: GatewayPaymentStatus = serde_json::from_str("\"disputed\"").unwrap();
        assert_eq!(status, GatewayPaymentStatus::Unknown);
    }

    #[test]
    fn test_payment_decode() {
        let payment: GatewayPayment = serde_json::from_str(
            r#"{"id":"pay_123","order_id":"order_abc","status":"captured","amount":20000,"currency":"INR","method":"upi"}"#,
        )
        .unwrap();
        assert_eq!(payment.id, "pay_123");
        assert_eq!(payment.amount, 20000);
        assert!(payment.status.is_captured());
    }
}
