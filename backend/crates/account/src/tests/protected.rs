//! # Protected Route Tests
//!
//! Profile, history, wallet and API key routes behind the session token.

use super::*;
use crate::application::messages;
use crate::domain::collaborator::UserService;
use serde_json::json;

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_missing_or_bad_token_unauthorized() {
    let app = TestApp::new();

    let missing = app.send(get("/user")).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let bad = app.send(authed_get("/user", "not.a-token")).await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);

    let verify = app.send(get("/verify-token")).await;
    assert_eq!(verify.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_get_user_strips_password() {
    let app = TestApp::new();
    let (user, token) = app.user("jane@example.io").await;

    let stored = app.exchange.user_by_email("jane@example.io").await.unwrap();
    assert!(stored.password.is_some());

    let response = app.send(authed_get("/user", &token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["id"], user.id);
    assert_eq!(body["email"], "jane@example.io");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_update_settings_merges() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let response = app
        .send(authed_json(
            "PUT",
            "/user/settings",
            &token,
            json!({ "language": "ja", "chat": { "set_username": true } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["settings"]["language"], "ja");
    assert_eq!(body["settings"]["chat"]["set_username"], true);
    assert!(body["settings"].get("notification").is_some());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let wrong = app
        .send(authed_json(
            "POST",
            "/user/change-password",
            &token,
            json!({ "old_password": "not the password", "new_password": "another secret" }),
        ))
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.message(), "Invalid password");

    let response = app
        .send(authed_json(
            "POST",
            "/user/change-password",
            &token,
            json!({ "old_password": PASSWORD, "new_password": "another secret" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), messages::PASSWORD_CHANGED);
}

#[tokio::test]
async fn test_set_username() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let response = app
        .send(authed_json(
            "POST",
            "/user/username",
            &token,
            json!({ "username": "jane_doe" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), messages::USERNAME_CHANGED);

    let invalid = app
        .send(authed_json(
            "POST",
            "/user/username",
            &token,
            json!({ "username": "Jane Doe!" }),
        ))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.message().starts_with("Username must be"));
}

#[tokio::test]
async fn test_deactivate_revokes_session() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let response = app
        .send(authed_json("POST", "/user/deactivate", &token, json!({})))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Account jane@example.io deactivated");

    let after = app.send(authed_get("/user", &token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Login history
// ============================================================================

async fn logged_in_twice(app: &TestApp) -> String {
    let (_, token) = app.user("jane@example.io").await;
    for _ in 0..2 {
        let response = app
            .send(json(
                "POST",
                "/login",
                json!({ "email": "jane@example.io", "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }
    token
}

#[tokio::test]
async fn test_logins_as_json() {
    let app = TestApp::new();
    let token = logged_in_twice(&app).await;

    let response = app
        .send(authed_get("/user/logins?limit=1&page=1&order=asc", &token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["ip"], "203.0.113.9");
}

#[tokio::test]
async fn test_logins_as_csv() {
    let app = TestApp::new();
    let token = logged_in_twice(&app).await;

    let response = app
        .send(authed_get("/user/logins?format=csv", &token))
        .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.headers[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=devexchange-logins.csv"
    );

    let csv = response.text();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,ip,device,domain,origin,referer,status,timestamp")
    );
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn test_logins_format_flag() {
    let app = TestApp::new();
    let token = logged_in_twice(&app).await;

    for (uri, expected) in [
        ("/user/logins?format=", StatusCode::OK),
        ("/user/logins?format=false", StatusCode::OK),
        ("/user/logins?format=true", StatusCode::ACCEPTED),
        ("/user/logins?format=csv", StatusCode::ACCEPTED),
    ] {
        let response = app.send(authed_get(uri, &token)).await;
        assert_eq!(response.status, expected, "{uri}");

        if expected == StatusCode::OK {
            assert_eq!(response.json()["count"], 2, "{uri}");
        } else {
            assert_eq!(response.headers[header::CONTENT_TYPE], "text/csv", "{uri}");
        }
    }
}

#[tokio::test]
async fn test_logins_bad_query_answers_message() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let response = app
        .send(authed_get("/user/logins?limit=many", &token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("limit"));
}

// ============================================================================
// Affiliation / stats
// ============================================================================

#[tokio::test]
async fn test_affiliation_count() {
    let app = TestApp::new();
    let (user, token) = app.user("jane@example.io").await;

    app.send(json(
        "POST",
        "/signup",
        json!({
            "email": "friend@example.io",
            "password": PASSWORD,
            "referral": user.affiliation_code,
        }),
    ))
    .await;

    let response = app.send(authed_get("/user/affiliation", &token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "count": 1 }));
}

#[tokio::test]
async fn test_user_stats() {
    let app = TestApp::new();
    let (user, token) = app.user("jane@example.io").await;

    let response = app.send(authed_get("/user/stats", &token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["user_id"], user.id);
}

// ============================================================================
// Wallet
// ============================================================================

#[tokio::test]
async fn test_balance_lists_supported_coins() {
    let app = TestApp::new();
    let (user, token) = app.user("jane@example.io").await;
    app.exchange.deposit(user.id, "btc", 1.25).await.unwrap();

    let response = app.send(authed_get("/user/balance", &token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["assets"]["btc"]["available"], 1.25);
    assert_eq!(body["assets"]["eth"]["balance"], 0.0);
}

#[tokio::test]
async fn test_create_address() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let response = app
        .send(authed_get("/user/create-address?crypto=eth", &token))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["currency"], "eth");
    assert!(body["address"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn test_create_address_invalid_crypto() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let unsupported = app
        .send(authed_get("/user/create-address?crypto=doge", &token))
        .await;
    assert_eq!(unsupported.status, StatusCode::NOT_FOUND);
    assert_eq!(unsupported.message(), "Invalid crypto: \"doge\"");

    let missing = app
        .send(authed_get("/user/create-address", &token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Invalid crypto: \"\"");
}

#[tokio::test]
async fn test_create_address_checks_coin_before_creating() {
    let (app, backend) = TestApp::counting();
    let (_, token) = app.user("jane@example.io").await;

    for uri in ["/user/create-address?crypto=doge", "/user/create-address"] {
        let response = app.send(authed_get(uri, &token)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(backend.addresses_created(), 0);

    let created = app
        .send(authed_get("/user/create-address?crypto=btc", &token))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(backend.addresses_created(), 1);
}

#[tokio::test]
async fn test_cancel_withdrawal() {
    let app = TestApp::new();
    let (user, token) = app.user("jane@example.io").await;
    app.exchange.deposit(user.id, "btc", 1.0).await.unwrap();
    let withdrawal = app
        .exchange
        .record_withdrawal(user.id, "btc", 0.5)
        .await
        .unwrap();

    let response = app
        .send(authed_json(
            "DELETE",
            "/user/withdrawal",
            &token,
            json!({ "transaction_id": withdrawal.transaction_id }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "cancelled");

    let unknown = app
        .send(authed_json(
            "DELETE",
            "/user/withdrawal",
            &token,
            json!({ "transaction_id": "missing" }),
        ))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.json(), json!({ "message": "Withdrawal not found" }));

    let malformed = app
        .send(authed_json("DELETE", "/user/withdrawal", &token, json!({})))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.message().contains("transaction_id"));
}

// ============================================================================
// HMAC tokens
// ============================================================================

#[tokio::test]
async fn test_hmac_token_routes() {
    let app = TestApp::new();
    let (_, token) = app.user("jane@example.io").await;

    let created = app
        .send(authed_json(
            "POST",
            "/user/tokens",
            &token,
            json!({ "name": "trading bot" }),
        ))
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let created = created.json();
    assert!(created["secret"].is_string());
    let token_id = created["id"].as_i64().unwrap();

    let listed = app.send(authed_get("/user/tokens", &token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let listed = listed.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(listed[0].get("secret").is_none());

    let deleted = app
        .send(authed_json(
            "DELETE",
            "/user/tokens",
            &token,
            json!({ "token_id": token_id }),
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.message(), messages::TOKEN_REMOVED);

    let empty_name = app
        .send(authed_json(
            "POST",
            "/user/tokens",
            &token,
            json!({ "name": "  " }),
        ))
        .await;
    assert_eq!(empty_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_name.message(), "Token name is required");
}
