use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use stayhub::config::AppConfig;
use stayhub::db;
use stayhub::handlers;
use stayhub::services::payments::{
    GatewayOrder, GatewayOrderStatus, OrderRequest, PaymentProvider,
};
use stayhub::state::AppState;

// ── Mock Payment Provider ──

struct MockPayments {
    status: Arc<Mutex<GatewayOrderStatus>>,
}

#[async_trait]
impl PaymentProvider for MockPayments {
    async fn create_order(&self, order: &OrderRequest) -> anyhow::Result<GatewayOrder> {
        Ok(GatewayOrder {
            order_id: order.order_id.clone(),
            payment_session_id: "session_test".to_string(),
        })
    }

    async fn fetch_order_status(&self, _order_id: &str) -> anyhow::Result<GatewayOrderStatus> {
        Ok(*self.status.lock().unwrap())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        cashfree_base_url: "http://localhost:9999".to_string(),
        cashfree_app_id: "app".to_string(),
        cashfree_secret_key: "secret".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    test_state_with_gateway().0
}

fn test_state_with_gateway() -> (Arc<AppState>, Arc<Mutex<GatewayOrderStatus>>) {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let status = Arc::new(Mutex::new(GatewayOrderStatus::Active));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        payments: Box::new(MockPayments {
            status: Arc::clone(&status),
        }),
    });
    (state, status)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/properties",
            get(handlers::properties::search_properties).post(handlers::properties::create_property),
        )
        .route("/api/properties/:id", get(handlers::properties::get_property))
        .route(
            "/api/properties/:id/deactivate",
            post(handlers::properties::deactivate_property),
        )
        .route(
            "/api/properties/:id/reviews",
            get(handlers::reviews::list_property_reviews),
        )
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel_booking))
        .route("/api/bookings/:id/status", post(handlers::bookings::set_booking_status))
        .route(
            "/api/bookings/:id/payment",
            post(handlers::payments::create_payment_order),
        )
        .route(
            "/api/bookings/:id/payment/sync",
            post(handlers::payments::sync_payment),
        )
        .route("/api/bookings/:id/review", post(handlers::reviews::submit_review))
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .with_state(state)
}

fn post_json(uri: &str, actor: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_with_actor(uri: &str, actor: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_property(
    state: &Arc<AppState>,
    host: &str,
    accommodates: i32,
    base_price: i64,
    cleaning_fee: i64,
) -> String {
    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/properties",
            Some(host),
            serde_json::json!({
                "title": "Sea-facing villa",
                "city": "Goa",
                "accommodates": accommodates,
                "base_price": base_price,
                "cleaning_fee": cleaning_fee,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn create_booking(
    state: &Arc<AppState>,
    guest: &str,
    property_id: &str,
    check_in: &str,
    check_out: &str,
) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/bookings",
            Some(guest),
            serde_json::json!({
                "property_id": property_id,
                "check_in": check_in,
                "check_out": check_out,
                "adults": 2,
            }),
        ))
        .await
        .unwrap();
    let status = res.status();
    (status, body_json(res).await)
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Properties ──

#[tokio::test]
async fn test_create_and_get_property() {
    let state = test_state();
    let id = create_property(&state, "host-1", 4, 3500, 500).await;

    let res = test_app(state)
        .oneshot(get_with_actor(&format!("/api/properties/{id}"), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["host_id"], "host-1");
    assert_eq!(json["accommodates"], 4);
    assert_eq!(json["base_price"], 3500);
    assert_eq!(json["is_active"], true);
}

#[tokio::test]
async fn test_create_property_requires_actor() {
    let res = test_app(test_state())
        .oneshot(post_json(
            "/api/properties",
            None,
            serde_json::json!({
                "title": "Villa", "city": "Goa", "accommodates": 2, "base_price": 1000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_property_rejects_zero_capacity() {
    let res = test_app(test_state())
        .oneshot(post_json(
            "/api/properties",
            Some("host-1"),
            serde_json::json!({
                "title": "Villa", "city": "Goa", "accommodates": 0, "base_price": 1000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_properties_filters() {
    let state = test_state();
    create_property(&state, "host-1", 2, 1500, 0).await;
    create_property(&state, "host-2", 6, 5000, 800).await;

    // Guest-count filter
    let res = test_app(state.clone())
        .oneshot(get_with_actor("/api/properties?guests=4", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["accommodates"], 6);

    // Price ceiling filter
    let res = test_app(state.clone())
        .oneshot(get_with_actor("/api/properties?max_price=2000", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["base_price"], 1500);

    // City filter is case-insensitive
    let res = test_app(state)
        .oneshot(get_with_actor("/api/properties?city=goa", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

// ── Bookings ──

#[tokio::test]
async fn test_booking_happy_path_with_reference_pricing() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let (status, json) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["host_id"], "host-1");
    assert_eq!(json["pricing"]["nights"], 3);
    assert_eq!(json["pricing"]["subtotal"], 10500);
    assert_eq!(json["pricing"]["cleaning_fee"], 500);
    assert_eq!(json["pricing"]["service_fee"], 1470);
    assert_eq!(json["pricing"]["taxes"], 998);
    assert_eq!(json["pricing"]["total"], 13468);
    assert_eq!(json["pricing"]["currency"], "INR");
}

#[tokio::test]
async fn test_booking_requires_actor() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let res = test_app(state)
        .oneshot(post_json(
            "/api/bookings",
            None,
            serde_json::json!({
                "property_id": property_id,
                "check_in": "2030-06-10",
                "check_out": "2030-06-13",
                "adults": 2,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_overlapping_booking_rejected_adjacent_allowed() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let (status, _) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-15").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) =
        create_booking(&state, "guest-2", &property_id, "2030-06-12", "2030-06-18").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("overlap"));

    // Back-to-back stay starting on the previous check-out day
    let (status, _) =
        create_booking(&state, "guest-2", &property_id, "2030-06-15", "2030-06-20").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_capacity_exceeded_rejected() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let res = test_app(state)
        .oneshot(post_json(
            "/api/bookings",
            Some("guest-1"),
            serde_json::json!({
                "property_id": property_id,
                "check_in": "2030-06-10",
                "check_out": "2030-06-13",
                "adults": 3,
                "children": 2,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_booking_on_deactivated_property_rejected() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/properties/{property_id}/deactivate"),
            Some("host-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, _) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_booking_with_past_check_in_rejected() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;

    let (status, _) =
        create_booking(&state, "guest-1", &property_id, "2020-06-10", "2020-06-13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_unknown_property() {
    let state = test_state();
    let (status, _) = create_booking(&state, "guest-1", "missing", "2030-06-10", "2030-06-13").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_booking_restricted_to_parties() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(get_with_actor(&format!("/api/bookings/{id}"), Some("guest-1")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(get_with_actor(&format!("/api/bookings/{id}"), Some("stranger")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Status transitions ──

#[tokio::test]
async fn test_guest_cancellation_records_metadata() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/cancel"),
            Some("guest-1"),
            serde_json::json!({ "reason": "change of plans" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "cancelled_by_guest");
    assert_eq!(json["cancellation"]["cancelled_by"], "guest-1");
    assert_eq!(json["cancellation"]["reason"], "change of plans");
}

#[tokio::test]
async fn test_host_confirms_then_completes() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/status"),
            Some("host-1"),
            serde_json::json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "confirmed");

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/status"),
            Some("host-1"),
            serde_json::json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "completed");
}

#[tokio::test]
async fn test_invalid_transition_conflicts() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    // completed straight from pending is not in the transition table
    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/status"),
            Some("host-1"),
            serde_json::json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stranger_cannot_transition() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/status"),
            Some("stranger"),
            serde_json::json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Payments ──

#[tokio::test]
async fn test_payment_paid_confirms_reservation() {
    let (state, gateway_status) = test_state_with_gateway();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order = body_json(res).await;
    assert_eq!(order["amount"], 13468);
    assert_eq!(order["currency"], "INR");
    assert_eq!(order["payment_session_id"], "session_test");

    *gateway_status.lock().unwrap() = GatewayOrderStatus::Paid;
    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment/sync"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["payment"]["status"], "paid");
}

#[tokio::test]
async fn test_payment_expired_marks_payment_failed() {
    let (state, gateway_status) = test_state_with_gateway();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    *gateway_status.lock().unwrap() = GatewayOrderStatus::Expired;
    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment/sync"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "payment_failed");
    assert_eq!(json["payment"]["status"], "failed");
}

#[tokio::test]
async fn test_payment_order_only_for_pending() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/status"),
            Some("host-1"),
            serde_json::json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_order_only_for_guest() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/payment"),
            Some("host-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Reviews ──

#[tokio::test]
async fn test_review_after_completed_stay() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    for status in ["confirmed", "completed"] {
        let res = test_app(state.clone())
            .oneshot(post_json(
                &format!("/api/bookings/{id}/status"),
                Some("host-1"),
                serde_json::json!({ "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/review"),
            Some("guest-1"),
            serde_json::json!({ "rating": 5, "comment": "wonderful stay" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state)
        .oneshot(get_with_actor(&format!("/api/properties/{property_id}/reviews"), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(json["average_rating"], 5.0);
}

#[tokio::test]
async fn test_review_rejected_before_completion() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/bookings/{id}/review"),
            Some("guest-1"),
            serde_json::json!({ "rating": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let res = test_app(test_state())
        .oneshot(get_with_actor("/api/admin/status", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let res = test_app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/admin/status")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_status_counts() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/status")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["active_properties"], 1);
    assert_eq!(json["pending_reservations"], 1);
    assert_eq!(json["confirmed_reservations"], 0);
}

#[tokio::test]
async fn test_admin_bookings_list_with_filter() {
    let state = test_state();
    let property_id = create_property(&state, "host-1", 4, 3500, 500).await;
    let (_, booking) =
        create_booking(&state, "guest-1", &property_id, "2030-06-10", "2030-06-13").await;
    let id = booking["id"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/bookings/{id}/cancel"),
            Some("guest-1"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings?status=cancelled_by_guest")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings?status=pending")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}
