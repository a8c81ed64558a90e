use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{body::Body, Json, Router};
use estate_agents::FALLBACK_REPLY;
use estate_core::{Buyer, Seller};
use estate_tests::{
    app_with_completion, get, offline_app, offline_sqlite_app, post_json, send,
    spawn_completion_mock, TEST_API_KEY,
};
use serde_json::{json, Value};

async fn gemini_hello(
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if params.get("key").map(String::as_str) != Some(TEST_API_KEY) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    if !prompt.starts_with("You are a helpful real estate assistant.")
        || body["generationConfig"]["topK"] != 40
    {
        return StatusCode::BAD_REQUEST.into_response();
    }

    Json(json!({
        "candidates": [
            { "content": { "parts": [{ "text": "Hello!" }], "role": "model" } }
        ]
    }))
    .into_response()
}

async fn gemini_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response()
}

async fn gemini_no_candidates() -> Response {
    Json(json!({ "candidates": [] })).into_response()
}

async fn gemini_slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": "too late" }] } }]
    }))
    .into_response()
}

fn buyer_body(name: &str) -> Value {
    json!({
        "name": name,
        "budget": "70L",
        "location": "Electronic City",
        "property_type": "2BHK",
        "contact": "+91 90000 00010"
    })
}

#[tokio::test]
async fn root_reports_running() {
    let app = offline_app().await;

    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "running" }));
}

#[tokio::test]
async fn health_reports_backend_and_metrics() {
    let app = offline_app().await;

    let (status, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["completion_configured"], false);
    assert_eq!(body["metrics"]["chat_requests_total"], 0);
}

#[tokio::test]
async fn fixtures_are_listed_newest_first() {
    let app = offline_app().await;

    let (status, body) = send(&app, get("/api/buyers")).await;
    assert_eq!(status, StatusCode::OK);
    let names = body["buyers"]
        .as_array()
        .expect("buyers array")
        .iter()
        .map(|buyer| buyer["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Anita", "Rahul"]);

    let (status, body) = send(&app, get("/api/sellers")).await;
    assert_eq!(status, StatusCode::OK);
    let sellers: Vec<Seller> = serde_json::from_value(body["sellers"].clone()).unwrap();
    assert_eq!(sellers.len(), 2);
    assert_eq!(sellers[0].name, "Priya");
    assert_eq!(sellers[1].name, "Mr. Sharma");
}

async fn assert_created_buyer_listed_first(app: Router) {
    let before = chrono::Utc::now();

    let (status, body) = send(&app, post_json("/api/buyers", buyer_body("Vikram"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Buyer added successfully");
    let created: Buyer = serde_json::from_value(body["buyer"].clone()).unwrap();
    assert_eq!(created.name, "Vikram");
    assert!(created.created_at >= before);

    let (_, body) = send(&app, get("/api/buyers")).await;
    let buyers: Vec<Buyer> = serde_json::from_value(body["buyers"].clone()).unwrap();
    assert_eq!(buyers.len(), 3);
    assert_eq!(buyers[0], created);
    assert!(buyers.iter().skip(1).all(|buyer| buyer.id != created.id));
    assert!(buyers
        .windows(2)
        .all(|pair| (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id)));
}

#[tokio::test]
async fn created_buyer_appears_first_in_listing() {
    assert_created_buyer_listed_first(offline_app().await).await;
}

#[tokio::test]
async fn created_buyer_appears_first_in_sqlite_listing() {
    assert_created_buyer_listed_first(offline_sqlite_app().await).await;
}

#[tokio::test]
async fn created_seller_is_returned_with_message() {
    let app = offline_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/sellers",
            json!({
                "name": "Farhan",
                "property_type": "Plot",
                "location": "Yelahanka",
                "price": "1.2Cr",
                "contact": "+91 90000 00011"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Seller added successfully");
    assert_eq!(body["seller"]["price"], "1.2Cr");
    assert!(body["seller"]["id"].as_i64().unwrap_or_default() > 0);
}

#[tokio::test]
async fn malformed_buyer_is_rejected_before_the_store() {
    let app = offline_app().await;

    let mut missing_contact = buyer_body("Nobody");
    missing_contact
        .as_object_mut()
        .expect("object body")
        .remove("contact");
    let (status, _) = send(&app, post_json("/api/buyers", missing_contact)).await;
    assert!(status.is_client_error());

    let mut numeric_budget = buyer_body("Nobody");
    numeric_budget["budget"] = json!(7000000);
    let (status, _) = send(&app, post_json("/api/buyers", numeric_budget)).await;
    assert!(status.is_client_error());

    let (_, body) = send(&app, get("/api/buyers")).await;
    assert_eq!(body["buyers"].as_array().map(Vec::len), Some(2));
}

async fn assert_duplicate_users_conflict(app: Router) {
    let user = json!({
        "username": "rahul",
        "email": "rahul@example.com",
        "password": "secret",
        "full_name": "Rahul K",
        "phone": "+91 98765 43210",
        "location": "Bangalore"
    });

    let (status, body) = send(&app, post_json("/api/users", user.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(&app, post_json("/api/users", user.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username_taken");

    let mut same_email = user;
    same_email["username"] = json!("rahul-two");
    let (status, body) = send(&app, post_json("/api/users", same_email)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_taken");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    assert_duplicate_users_conflict(offline_app().await).await;
}

#[tokio::test]
async fn duplicate_username_is_a_conflict_on_sqlite() {
    assert_duplicate_users_conflict(offline_sqlite_app().await).await;
}

#[tokio::test]
async fn sqlite_fixtures_are_listed_newest_first() {
    let app = offline_sqlite_app().await;

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "sqlite");

    let (_, body) = send(&app, get("/api/sellers")).await;
    let sellers: Vec<Seller> = serde_json::from_value(body["sellers"].clone()).unwrap();
    let names = sellers.iter().map(|seller| seller.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Priya", "Mr. Sharma"]);
}

#[tokio::test]
async fn chat_returns_completion_reply() {
    let endpoint = spawn_completion_mock(Router::new().fallback(gemini_hello)).await;
    let app = app_with_completion(endpoint, Duration::from_secs(5)).await;

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "I want to sell my house" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "intent": "SELLER",
            "reply": "Hello!",
            "automation": "Notified interested buyers"
        })
    );
}

#[tokio::test]
async fn chat_falls_back_on_non_success_status() {
    let endpoint = spawn_completion_mock(Router::new().fallback(gemini_unavailable)).await;
    let app = app_with_completion(endpoint, Duration::from_secs(5)).await;

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "I want to buy a flat" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "intent": "BUYER",
            "reply": FALLBACK_REPLY,
            "automation": "Notified available sellers"
        })
    );
}

#[tokio::test]
async fn chat_falls_back_on_empty_candidates() {
    let endpoint = spawn_completion_mock(Router::new().fallback(gemini_no_candidates)).await;
    let app = app_with_completion(endpoint, Duration::from_secs(5)).await;

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "How do property taxes work?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "UNKNOWN");
    assert_eq!(body["reply"], FALLBACK_REPLY);
    assert_eq!(body["automation"], "No automation triggered");
}

#[tokio::test]
async fn chat_falls_back_when_deadline_passes() {
    let endpoint = spawn_completion_mock(Router::new().fallback(gemini_slow)).await;
    let app = app_with_completion(endpoint, Duration::from_millis(200)).await;

    let started = std::time::Instant::now();
    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "I want to buy a flat" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "BUYER");
    assert_eq!(body["reply"], FALLBACK_REPLY);
    assert!(started.elapsed() < Duration::from_secs(5));

    let (_, health) = send(&app, get("/api/health")).await;
    assert_eq!(health["metrics"]["fallback_total"], 1);
}

#[tokio::test]
async fn chat_without_api_key_uses_fallback() {
    let app = offline_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/chat",
            json!({ "message": "Selling my flat, but also looking for a plot" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "BUYER");
    assert_eq!(body["reply"], FALLBACK_REPLY);
}

#[tokio::test]
async fn chat_requires_a_message_field() {
    let app = offline_app().await;

    let (status, _) = send(&app, post_json("/chat", json!({ "text": "hi" }))).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_with_credentials() {
    let app = offline_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/chat")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-custom")
        .body(Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.clone(), request)
        .await
        .unwrap();
    let headers = response.headers();

    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        headers
            .get("access-control-allow-credentials")
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    assert_eq!(
        headers
            .get("access-control-allow-methods")
            .and_then(|value| value.to_str().ok()),
        Some("POST")
    );
}

#[tokio::test]
async fn cors_omits_allow_origin_for_other_origins() {
    let app = offline_app().await;

    let request = Request::builder()
        .uri("/")
        .header("origin", "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
