//! Integration tests for identity and the authentication gate.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p orchard-api)
//!
//! Run with: cargo test -p orchard-integration-tests -- --ignored

use serde_json::{Value, json};

use orchard_integration_tests::{base_url, client, signup_user};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn signup_login_me_roundtrip() {
    let client = client();
    let (user, token) = signup_user(&client).await;
    let email = user["email"].as_str().expect("email");

    // Fresh login with the same credentials
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "integration-pass" }))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), 200);
    let login: Value = resp.json().await.expect("login response not JSON");
    let fresh_token = login["token"].as_str().expect("token");

    // Both tokens resolve the same caller
    for t in [token.as_str(), fresh_token] {
        let me: Value = client
            .get(format!("{}/api/auth/me", base_url()))
            .bearer_auth(t)
            .send()
            .await
            .expect("me failed")
            .json()
            .await
            .expect("me response not JSON");
        assert_eq!(me["user"]["email"], email);
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn login_with_wrong_password_is_unauthorized() {
    let client = client();
    let (user, _) = signup_user(&client).await;

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({
            "email": user["email"],
            "password": "definitely-wrong",
        }))
        .send()
        .await
        .expect("login failed");

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn logout_blacklists_a_still_valid_token() {
    let client = client();
    let (_, token) = signup_user(&client).await;

    // Token works before logout
    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me failed");
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/api/auth/logout", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("logout failed");
    assert_eq!(resp.status(), 200);

    // The token's own signature and expiry are still valid, but the
    // blacklist rejects it on every subsequent request
    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me after logout failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn missing_and_garbage_tokens_are_unauthorized() {
    let client = client();

    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("me failed");
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("me failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn admin_routes_reject_plain_users() {
    let client = client();
    let (_, token) = signup_user(&client).await;

    let resp = client
        .get(format!("{}/api/admin/dashboard", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("dashboard failed");

    assert_eq!(resp.status(), 403);
}
