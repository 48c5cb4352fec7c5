//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use outlay_ocr::MockRecognizer;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::AuthConfig;

const PASSWORD: &str = "Secret1@pass";

fn test_config() -> ServerConfig {
    ServerConfig {
        auth: AuthConfig {
            access_secret: "test-access-secret-test-access-secret".into(),
            refresh_secret: "test-refresh-secret-test-refresh-secret".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn setup_test_app() -> Router {
    let recognizer = MockRecognizer::new("Corner Cafe\nLatte 4.50\nTotal 4.50");
    let state = Arc::new(AppState::new(test_config(), Box::new(recognizer)));
    create_router(state)
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, get_body_json(response).await)
}

async fn register(app: &Router, username: &str, email: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        })),
    )
    .await
}

async fn login(app: &Router, email: &str) -> (String, String) {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    (
        json["data"]["accessToken"].as_str().unwrap().to_string(),
        json["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Register and log in a user, returning the access token.
async fn signed_in(app: &Router, username: &str, email: &str) -> String {
    let (status, _) = register(app, username, email).await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, email).await.0
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
    let (status, json) = send(app, "POST", "/api/expenses", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();
    let (status, json) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["data"]["timestamp"].is_string());
}

// ========== Registration & Login ==========

#[tokio::test]
async fn test_register_returns_public_profile() {
    let app = setup_test_app();
    let (status, json) = register(&app, "alice_w", "Alice@Example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["ok"], true);
    assert_eq!(json["data"]["username"], "alice_w");
    assert_eq!(json["data"]["email"], "alice@example.com");
    assert!(json["data"].get("passwordHash").is_none());
    assert!(json["data"].get("password").is_none());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = setup_test_app();
    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "bob",
            "email": "not-an-email",
            "password": "weak",
            "confirmPassword": "different",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["ok"], false);
    for field in ["username", "email", "password", "confirmPassword"] {
        assert!(json["errors"][field].is_array(), "missing {field}: {json}");
    }
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = setup_test_app();
    let (status, _) = register(&app, "alice_w", "alice@example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = register(&app, "alice_2", "ALICE@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = setup_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email() {
    let app = setup_test_app();
    register(&app, "alice_w", "alice@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "Wrong1@pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid credentials");

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = setup_test_app();
    let (status, json) = send(&app, "POST", "/api/auth/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["errors"]["email"].is_array());
    assert!(json["errors"]["password"].is_array());
}

// ========== Tokens ==========

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = setup_test_app();
    for (method, uri) in [
        ("GET", "/api/user/info"),
        ("GET", "/api/expenses"),
        ("GET", "/api/expenses/summary"),
        ("POST", "/api/auth/logout"),
        ("DELETE", "/api/expenses/1"),
    ] {
        let (status, json) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(json["ok"], false);
    }

    let (status, _) = send(&app, "GET", "/api/user/info", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_info() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let (status, json) = send(&app, "GET", "/api/user/info", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["username"], "alice_w");
    assert_eq!(json["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = setup_test_app();
    register(&app, "alice_w", "alice@example.com").await;
    let (_, refresh) = login(&app, "alice@example.com").await;

    let (status, _) = send(&app, "GET", "/api/user/info", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = setup_test_app();
    register(&app, "alice_w", "alice@example.com").await;
    let (_, refresh) = login(&app, "alice@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let new_access = json["data"]["accessToken"].as_str().unwrap().to_string();
    let new_refresh = json["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh);

    let (status, _) = send(&app, "GET", "/api/user/info", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // The old refresh token was consumed by the rotation.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(json!({ "refreshToken": new_refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_requires_a_token() {
    let app = setup_test_app();
    let (status, _) =
        send(&app, "POST", "/api/auth/refresh-token", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(json!({ "refreshToken": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = setup_test_app();
    register(&app, "alice_w", "alice@example.com").await;
    let (access, refresh) = login(&app, "alice@example.com").await;

    let (status, json) = send(&app, "POST", "/api/auth/logout", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ========== Expenses ==========

#[tokio::test]
async fn test_expense_crud() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let created = create(
        &app,
        &token,
        json!({
            "category": "Food",
            "amount": 12.5,
            "description": "  Lunch  ",
            "date": "2024-05-20",
            "paymentMethod": "UPI",
        }),
    )
    .await;
    assert_eq!(created["amount"], 12.5);
    assert_eq!(created["description"], "Lunch");
    assert_eq!(created["isRecurring"], false);
    let id = created["id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/expenses/{id}"),
        Some(&token),
        Some(json!({
            "category": "Groceries",
            "amount": 20,
            "date": "2024-05-21",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["category"], "Groceries");
    assert_eq!(json["data"]["paymentMethod"], "CASH");
    assert_eq!(json["data"]["id"], id);

    let (status, json) = send(&app, "GET", "/api/expenses", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/expenses/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/expenses/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_expense_rejects_non_positive_amount() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/expenses",
        Some(&token),
        Some(json!({ "category": "Food", "amount": 0, "date": "2024-05-20" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["errors"]["amount"].is_array());
}

#[tokio::test]
async fn test_create_expense_rejects_unknown_category() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/expenses",
        Some(&token),
        Some(json!({ "category": "Yachts", "amount": 10, "date": "2024-05-20" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_expenses_are_private() {
    let app = setup_test_app();
    let alice = signed_in(&app, "alice_w", "alice@example.com").await;
    let bob = signed_in(&app, "bob_smith", "bob@example.com").await;

    let expense = create(
        &app,
        &alice,
        json!({ "category": "Travel", "amount": 99.99, "date": "2024-06-01" }),
    )
    .await;
    let uri = format!("/api/expenses/{}", expense["id"]);

    let (status, json) = send(&app, "GET", "/api/expenses", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&bob),
        Some(json!({ "category": "Food", "amount": 1, "date": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&app, "GET", "/api/expenses", Some(&alice), None).await;
    assert_eq!(json["data"][0]["amount"], 99.99);
}

#[tokio::test]
async fn test_list_filters_and_grouping() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    for (category, amount, date, description) in [
        ("Food", 10.0, "2024-05-20", "Pizza night"),
        ("Food", 5.5, "2024-05-22", "Coffee"),
        ("Travel", 120.0, "2024-06-02", "Train tickets"),
        ("Shopping", 40.0, "2024-06-15", "Shoes"),
    ] {
        create(
            &app,
            &token,
            json!({
                "category": category,
                "amount": amount,
                "date": date,
                "description": description,
            }),
        )
        .await;
    }

    let (status, json) = send(
        &app,
        "GET",
        "/api/expenses?category=Food",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(json["data"][0]["description"], "Coffee");

    let (_, json) = send(&app, "GET", "/api/expenses?search=TRAIN", Some(&token), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (_, json) = send(
        &app,
        "GET",
        "/api/expenses?start=2024-06-01&end=2024-06-30",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (status, json) = send(&app, "GET", "/api/expenses?group=month", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let groups = json["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["key"], "2024-06");
    assert_eq!(groups[0]["total"], 160.0);
    assert_eq!(groups[1]["key"], "2024-05");
    assert_eq!(groups[1]["expenses"].as_array().unwrap().len(), 2);

    let (_, json) = send(
        &app,
        "GET",
        "/api/expenses?group=week&category=Food",
        Some(&token),
        None,
    )
    .await;
    let groups = json["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["key"], "2024-W21");
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let (status, json) = send(&app, "GET", "/api/expenses?group=fortnight", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_summary() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    for (category, amount) in [("Food", 10.25), ("Travel", 30.0), ("Food", 4.75)] {
        create(
            &app,
            &token,
            json!({ "category": category, "amount": amount, "date": "2024-05-20" }),
        )
        .await;
    }

    let (status, json) = send(&app, "GET", "/api/expenses/summary", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["total"], 45.0);
    assert_eq!(json["data"]["count"], 3);
    let by_category = json["data"]["byCategory"].as_array().unwrap();
    assert_eq!(by_category.len(), 2);
    let food = by_category.iter().find(|c| c["category"] == "Food").unwrap();
    assert_eq!(food["total"], 15.0);
    assert_eq!(food["count"], 2);

    let (_, json) = send(
        &app,
        "GET",
        "/api/expenses/summary?category=Travel",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(json["data"]["total"], 30.0);
    assert_eq!(json["data"]["count"], 1);
}

// ========== Receipts ==========

#[tokio::test]
async fn test_scan_receipt_text() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let text = "Item 1 10.00\nSub Total 10.00\nTax 1.00\nTotal 11.00";
    let (status, json) = send(
        &app,
        "POST",
        "/api/receipts/scan",
        Some(&token),
        Some(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["total"], 11.0);
    assert_eq!(json["data"]["rawText"], text);

    let (_, json) = send(
        &app,
        "POST",
        "/api/receipts/scan",
        Some(&token),
        Some(json!({ "text": "Thank you!" })),
    )
    .await;
    assert!(json["data"]["total"].is_null());
}

#[tokio::test]
async fn test_scan_receipt_requires_auth() {
    let app = setup_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/receipts/scan",
        None,
        Some(json!({ "text": "Total 1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_scan_receipt_image() {
    let app = setup_test_app();
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/receipts/scan-image")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0xff, 0xd8, 0xff, 0xe0]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["data"]["total"], 4.5);

    let request = Request::builder()
        .method("POST")
        .uri("/api/receipts/scan-image")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_image_without_engine() {
    let state = Arc::new(AppState::new(
        test_config(),
        Box::new(outlay_ocr::UnavailableRecognizer),
    ));
    let app = create_router(state);
    let token = signed_in(&app, "alice_w", "alice@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/receipts/scan-image")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from("png bytes"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ========== CORS ==========

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = setup_test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/expenses")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
