use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use stayhub::config::AppConfig;
use stayhub::db;
use stayhub::handlers;
use stayhub::services::payments::cashfree::CashfreeProvider;
use stayhub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.cashfree_app_id.is_empty() {
        tracing::warn!("CASHFREE_APP_ID not set, payment orders will fail");
    }
    let payments = CashfreeProvider::new(
        config.cashfree_base_url.clone(),
        config.cashfree_app_id.clone(),
        config.cashfree_secret_key.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(payments),
    });

    let app = Router::new()
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
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
