//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::{InMemoryServices, PaymentSessionController, ProviderSettings, SessionState};
use common::SessionId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_doubles().0
}

fn setup_with_doubles() -> (axum::Router, Arc<api::AppState>, InMemoryServices) {
    let doubles = InMemoryServices::new();
    let state = api::create_default_state(ProviderSettings::default(), doubles.services());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, doubles)
}

fn setup_with_ttl(ttl: Duration) -> (axum::Router, Arc<api::AppState>, InMemoryServices) {
    let doubles = InMemoryServices::new();
    let state = Arc::new(
        api::AppState::new(ProviderSettings::default(), doubles.services()).with_session_ttl(ttl),
    );
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, doubles)
}

async fn registered(state: &api::AppState, id: &str) -> PaymentSessionController {
    let id: SessionId = id.parse().unwrap();
    state.sessions.read().await[&id].controller.clone()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn create_session(app: &axum::Router, body: Value) -> Value {
    let (status, json) = send(app, post("/sessions", body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected response: {json}");
    json
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_session(
        &app,
        json!({"amount": "10.00", "currency": "SAR", "provider": "cash"}),
    )
    .await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("payment_sessions_started_total"));
}

#[tokio::test]
async fn test_cash_session_settles_on_create() {
    let (app, state, doubles) = setup_with_doubles();

    let json = create_session(
        &app,
        json!({"amount": "120.00", "currency": "sar", "provider": "cash"}),
    )
    .await;

    assert_eq!(json["state"], "Settled");
    assert_eq!(json["progress"], "finished");
    assert_eq!(json["amount"], "120.00");
    assert_eq!(json["currency"], "SAR");
    assert_eq!(json["outcome"]["outcome"], "settled");
    assert!(json.get("presentation").is_none());

    assert_eq!(doubles.identity.call_count(), 0);
    assert_eq!(doubles.finalizer.call_count(), 1);

    // Reported terminal outcome releases the session.
    assert_eq!(state.active_sessions().await, 0);
    let id = json["id"].as_str().unwrap();
    let (status, _) = send(&app, get(&format!("/sessions/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_card_session_flow() {
    let (app, state, doubles) = setup_with_doubles();

    let created = create_session(
        &app,
        json!({"amount": "75.50", "currency": "SAR", "provider": "card", "brand": "VISA"}),
    )
    .await;

    assert_eq!(created["state"], "AwaitingProviderUi");
    assert_eq!(created["progress"], "presenting");
    assert_eq!(created["checkout_id"], "CHK-0001");
    assert_eq!(created["presentation"]["surface"], "embedded_checkout");
    assert_eq!(created["presentation"]["checkout_id"], "CHK-0001");
    assert_eq!(created["presentation"]["brand"], "VISA");
    assert_eq!(created["presentation"]["settlement"], "synchronous");
    assert_eq!(state.active_sessions().await, 1);

    let id = created["id"].as_str().unwrap();

    let (status, snapshot) = send(&app, get(&format!("/sessions/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"], "AwaitingProviderUi");
    assert!(snapshot.get("progress").is_none());

    let (status, settled) = send(
        &app,
        post(
            &format!("/sessions/{id}/signals"),
            json!({"type": "completed", "resource_path": "/v1/checkouts/CHK-0001/payment"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["state"], "Settled");
    assert_eq!(
        settled["outcome"]["reference"],
        "/v1/checkouts/CHK-0001/payment"
    );
    assert_eq!(doubles.finalizer.call_count(), 1);

    let (status, _) = send(
        &app,
        post(
            &format!("/sessions/{id}/signals"),
            json!({"type": "completed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(doubles.finalizer.call_count(), 1);
}

#[tokio::test]
async fn test_async_card_reconciled_against_status() {
    let (app, _, doubles) = setup_with_doubles();

    let created = create_session(
        &app,
        json!({"amount": "40.00", "currency": "SAR", "provider": "card", "brand": "STC_PAY"}),
    )
    .await;
    assert_eq!(created["presentation"]["settlement"], "asynchronous");
    let id = created["id"].as_str().unwrap();

    let (_, json) = send(
        &app,
        post(
            &format!("/sessions/{id}/signals"),
            json!({"type": "completed", "resource_path": "xyz"}),
        ),
    )
    .await;

    assert_eq!(json["state"], "Settled");
    assert_eq!(json["resource_path"], "xyz");
    assert_eq!(doubles.status.call_count(), 1);
}

#[tokio::test]
async fn test_bnpl_redirect_flow() {
    let (app, _, doubles) = setup_with_doubles();

    let created = create_session(
        &app,
        json!({
            "amount": "600.00",
            "currency": "SAR",
            "provider": "bnpl",
            "items": [
                {"product_id": "101", "variation_name": "Black / 42", "variation_sku": "SKU-101-BK-42", "quantity": 1}
            ]
        }),
    )
    .await;

    assert_eq!(created["state"], "AwaitingAsyncConfirmation");
    assert_eq!(created["presentation"]["surface"], "external_browser");
    let url = created["presentation"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://bnpl.example.com/checkout/"));
    assert_eq!(created["hosted_checkout_url"], url);
    assert_eq!(doubles.bnpl.requests()[0].products.len(), 1);

    let id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        post(
            &format!("/sessions/{id}/redirect"),
            json!({"url": "https://bnpl.example.com/checkout/1/step-2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["progress"], "ignored");
    assert_eq!(json["state"], "AwaitingAsyncConfirmation");

    let (_, json) = send(
        &app,
        post(
            &format!("/sessions/{id}/redirect"),
            json!({"url": "https://checkout.example.com/bnpl/failure?order=1"}),
        ),
    )
    .await;
    assert_eq!(json["state"], "Failed");
    assert_eq!(json["outcome"]["reason"], "provider_declined");
    assert_eq!(doubles.finalizer.call_count(), 0);
}

#[tokio::test]
async fn test_dismiss_cancels_session() {
    let (app, _, doubles) = setup_with_doubles();

    let created = create_session(
        &app,
        json!({"amount": "20.00", "currency": "SAR", "provider": "wallet"}),
    )
    .await;
    assert_eq!(created["presentation"]["surface"], "wallet_sheet");
    assert_eq!(created["presentation"]["amount"], "20.00");
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, post(&format!("/sessions/{id}/dismiss"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "Cancelled");
    assert_eq!(json["outcome"]["outcome"], "cancelled");
    assert_eq!(doubles.finalizer.call_count(), 0);
}

#[tokio::test]
async fn test_ineligible_wallet_fails_without_backend_calls() {
    let (app, _, doubles) = setup_with_doubles();

    let json = create_session(
        &app,
        json!({
            "amount": "20.00",
            "currency": "SAR",
            "provider": "wallet",
            "wallet_eligible": false
        }),
    )
    .await;

    assert_eq!(json["state"], "Failed");
    assert_eq!(json["outcome"]["reason"], "not_supported");
    assert_eq!(doubles.backend_calls(), 0);
}

#[tokio::test]
async fn test_session_events() {
    let app = setup();

    let created = create_session(
        &app,
        json!({"amount": "75.50", "currency": "SAR", "provider": "card", "brand": "MADA"}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, get(&format!("/sessions/{id}/events"))).await;
    assert_eq!(status, StatusCode::OK);

    let types: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "SessionStarted",
            "CheckoutIdRequested",
            "CheckoutIdResolved",
            "ProviderPresented"
        ]
    );
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup();
    let id = common::SessionId::new();

    let (status, json) = send(&app, get(&format!("/sessions/{id}"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_session_id_is_bad_request() {
    let app = setup();

    let (status, json) = send(&app, post("/sessions/not-a-uuid/dismiss", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid session ID"));
}

#[tokio::test]
async fn test_invalid_create_requests() {
    let app = setup();

    let cases = [
        json!({"amount": "abc", "currency": "SAR", "provider": "cash"}),
        json!({"amount": "1.234", "currency": "SAR", "provider": "cash"}),
        json!({"amount": "0.00", "currency": "SAR", "provider": "cash"}),
        json!({"amount": "10.00", "currency": "RIYAL", "provider": "cash"}),
        json!({"amount": "10.00", "currency": "SAR", "provider": "card"}),
        json!({"amount": "10.00", "currency": "SAR", "provider": "card", "brand": "APPLE_PAY"}),
    ];

    for body in cases {
        let (status, json) = send(&app, post("/sessions", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request {body} gave {json}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_empty_redirect_url_is_bad_request() {
    let app = setup();
    let created = create_session(
        &app,
        json!({"amount": "600.00", "currency": "SAR", "provider": "bnpl"}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        post(&format!("/sessions/{id}/redirect"), json!({"url": " "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_stale_sessions_expire() {
    let (app, state, doubles) = setup_with_ttl(Duration::from_secs(60));
    let wallet = json!({"amount": "20.00", "currency": "SAR", "provider": "wallet"});

    let old = create_session(&app, wallet.clone()).await;
    let old_id = old["id"].as_str().unwrap();
    let old_controller = registered(&state, old_id).await;

    tokio::time::advance(Duration::from_secs(45)).await;
    let fresh = create_session(&app, wallet).await;
    let fresh_id = fresh["id"].as_str().unwrap();

    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(state.expire_stale_sessions().await, 1);
    assert_eq!(state.active_sessions().await, 1);
    assert_eq!(old_controller.state(), SessionState::Cancelled);

    let (status, _) = send(&app, get(&format!("/sessions/{old_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, json) = send(&app, get(&format!("/sessions/{fresh_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "AwaitingProviderUi");
    assert_eq!(doubles.finalizer.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_expires_sessions_on_interval() {
    let (app, state, _) = setup_with_ttl(Duration::from_secs(60));
    let sweeper = api::spawn_session_sweeper(state.clone(), Duration::from_secs(10));

    let created = create_session(
        &app,
        json!({"amount": "75.50", "currency": "SAR", "provider": "card", "brand": "MADA"}),
    )
    .await;
    let controller = registered(&state, created["id"].as_str().unwrap()).await;

    tokio::time::sleep(Duration::from_secs(55)).await;
    assert_eq!(state.active_sessions().await, 1);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(state.active_sessions().await, 0);
    assert_eq!(controller.state(), SessionState::Cancelled);

    sweeper.abort();
}
