//! Human-readable order and tracking reference numbers.
//!
//! Numbers carry a date prefix for support staff plus a random suffix drawn
//! from a v4 uuid. The suffix alone does not guarantee uniqueness; the
//! UNIQUE constraint on `orders.order_number` does, and a collision surfaces
//! as a conflict the client can retry.

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix in hex characters.
const SUFFIX_LEN: usize = 8;

/// Generate an order number: `ORD-YYYYMMDD-XXXXXXXX`.
#[must_use]
pub fn generate_order_number() -> String {
    format!(
        "ORD-{}-{}",
        Utc::now().format("%Y%m%d"),
        random_suffix()
    )
}

/// Generate a tracking number: `TRK-XXXXXXXX`.
#[must_use]
pub fn generate_tracking_number() -> String {
    format!("TRK-{}", random_suffix())
}

/// Eight uppercase hex characters from a fresh v4 uuid.
fn random_suffix() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id.chars()
        .take(SUFFIX_LEN)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_tracking_number_format() {
        let number = generate_tracking_number();
        assert!(number.starts_with("TRK-"));
        assert_eq!(number.len(), 4 + SUFFIX_LEN);
    }

    #[test]
    fn test_numbers_vary() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }
}
