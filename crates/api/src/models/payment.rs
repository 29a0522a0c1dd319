//! Payment attempt model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use orchard_core::{CurrencyCode, OrderId, PaymentId, PaymentStatus};

/// One payment attempt against an order.
///
/// `transaction_id` starts as the gateway's order/intent id and is replaced
/// by the captured payment id when verification succeeds.
/// `gateway_response` is the raw serialized gateway reply for audit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
