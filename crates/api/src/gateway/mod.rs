//! Payment gateway integration.
//!
//! This module provides:
//! - [`GatewayClient`] for the remote payment API (create order, fetch
//!   payment, refund)
//! - Response types for the subset of fields the flows consume
//! - Callback signature verification (HMAC-SHA256 over
//!   `"{order_id}|{payment_id}"` keyed by the gateway secret)
//!
//! The gateway bills in minor currency units (amount x 100); raw response
//! bodies are kept as JSON snapshots for the payments table.

mod client;
mod error;
mod types;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use types::{GatewayOrder, GatewayPayment, GatewayPaymentStatus, GatewayRefund};

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected callback signature for an order/payment pair.
///
/// Lowercase hex of HMAC-SHA256 over `"{order_id}|{payment_id}"`.
#[must_use]
pub fn callback_signature(secret: &[u8], order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    let tag = mac.finalize().into_bytes();
    tag.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify a client-supplied callback signature in constant time.
///
/// The provided value must be the lowercase hex HMAC; anything that fails to
/// decode is rejected outright.
#[must_use]
pub fn signature_matches(
    secret: &[u8],
    order_id: &str,
    payment_id: &str,
    provided: &str,
) -> bool {
    let Some(provided_bytes) = decode_hex(provided) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&provided_bytes).is_ok()
}

/// Decode a lowercase/uppercase hex string into bytes.
fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"gateway-signing-secret-for-tests";

    #[test]
    fn test_signature_roundtrip() {
        let sig = callback_signature(SECRET, "order-1", "pay_123");
        assert_eq!(sig.len(), 64);
        assert!(signature_matches(SECRET, "order-1", "pay_123", &sig));
    }

    #[test]
    fn test_signature_binds_both_ids() {
        let sig = callback_signature(SECRET, "order-1", "pay_123");
        assert!(!signature_matches(SECRET, "order-2", "pay_123", &sig));
        assert!(!signature_matches(SECRET, "order-1", "pay_456", &sig));
    }

    #[test]
    fn test_signature_rejects_wrong_secret() {
        let sig = callback_signature(b"other-secret", "order-1", "pay_123");
        assert!(!signature_matches(SECRET, "order-1", "pay_123", &sig));
    }

    #[test]
    fn test_signature_rejects_garbage() {
        assert!(!signature_matches(SECRET, "order-1", "pay_123", ""));
        assert!(!signature_matches(SECRET, "order-1", "pay_123", "zzzz"));
        assert!(!signature_matches(SECRET, "order-1", "pay_123", "abc"));
        // Truncated valid signature
        let sig = callback_signature(SECRET, "order-1", "pay_123");
        assert!(!signature_matches(
            SECRET,
            "order-1",
            "pay_123",
            sig.get(..32).unwrap()
        ));
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("00ff"), Some(vec![0x00, 0xff]));
        assert_eq!(decode_hex("deadbeef"), Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }
}
