//! Integration tests for Orchard.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p orchard-cli -- migrate
//!
//! # Start the API server
//! cargo run -p orchard-api
//!
//! # Run the (otherwise ignored) integration tests
//! cargo test -p orchard-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `API_BASE_URL` - Base URL of the running server (default
//!   `http://localhost:4000`)
//! - `ADMIN_TOKEN` - Bearer token of an admin user, required by tests that
//!   create catalog products or force order transitions

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// Bearer token for an admin user, from the environment.
#[must_use]
pub fn admin_token() -> String {
    std::env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set for admin-backed tests")
}

/// Plain HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::new()
}

/// Sign up a throwaway user and return `(user json, bearer token)`.
///
/// # Panics
///
/// Panics if the server rejects the signup.
pub async fn signup_user(client: &Client) -> (Value, String) {
    let email = format!("it-{}@example.com", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{}/api/auth/signup", base_url()))
        .json(&json!({
            "email": email,
            "password": "integration-pass",
            "firstName": "Test",
            "lastName": "Shopper",
        }))
        .send()
        .await
        .expect("signup request failed");

    assert_eq!(resp.status(), 201, "signup should succeed");
    let body: Value = resp.json().await.expect("signup response not JSON");
    let token = body["token"].as_str().expect("missing token").to_owned();
    (body["user"].clone(), token)
}

/// Create a product via the admin API and return its JSON.
///
/// # Panics
///
/// Panics if the server rejects the creation.
pub async fn create_product(client: &Client, price: &str, stock: i32) -> Value {
    let resp = client
        .post(format!("{}/api/admin/products", base_url()))
        .bearer_auth(admin_token())
        .json(&json!({
            "name": format!("IT Product {}", Uuid::new_v4().simple()),
            "price": price,
            "category": "integration",
            "stockQuantity": stock,
        }))
        .send()
        .await
        .expect("create product request failed");

    assert_eq!(resp.status(), 201, "product creation should succeed");
    let body: Value = resp.json().await.expect("product response not JSON");
    body["product"].clone()
}

/// Fetch a product's current state.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn fetch_product(client: &Client, id: &str) -> Value {
    let resp = client
        .get(format!("{}/api/products/{id}", base_url()))
        .send()
        .await
        .expect("get product request failed");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("product response not JSON");
    body["product"].clone()
}

/// A shipping address body accepted by order creation.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "fullName": "Test Shopper",
        "addressLine1": "42 Test Lane",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postalCode": "560001",
    })
}
