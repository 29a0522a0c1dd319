//! Order, line item, tracking, and address snapshot models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{CurrencyCode, OrderId, OrderItemId, OrderStatus, ProductId, TrackingEventId, UserId};

/// Address captured onto an order at creation time.
///
/// This is a value snapshot, not a reference to the address book: editing or
/// deleting a `user_addresses` row later never changes an existing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

fn default_country() -> String {
    "India".to_string()
}

/// An order header row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable order line item snapshot.
///
/// Name and price are copied from the product at order time and never
/// updated afterwards, so later catalog edits cannot rewrite history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One append-only tracking log entry for an order status transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: TrackingEventId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub description: String,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_snapshot_defaults_country() {
        let json = r#"{
            "fullName": "Asha Rao",
            "addressLine1": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "postalCode": "560001"
        }"#;
        let addr: AddressSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(addr.country, "India");
        assert!(addr.address_line2.is_none());
    }

    #[test]
    fn test_address_snapshot_roundtrip() {
        let addr = AddressSnapshot {
            full_name: "Asha Rao".to_string(),
            address_line1: "12 MG Road".to_string(),
            address_line2: Some("Flat 4B".to_string()),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
            country: "India".to_string(),
            phone: Some("+919876543210".to_string()),
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["fullName"], "Asha Rao");
        let back: AddressSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.postal_code, addr.postal_code);
    }
}
