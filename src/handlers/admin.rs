use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

use super::bookings::ReservationResponse;
use super::bearer_token;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let token = bearer_token(headers).unwrap_or("");
    if expected_token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    active_properties: i64,
    pending_reservations: i64,
    confirmed_reservations: i64,
    upcoming_check_ins: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatusResponse {
        active_properties: stats.active_properties,
        pending_reservations: stats.pending_reservations,
        confirmed_reservations: stats.confirmed_reservations,
        upcoming_check_ins: stats.upcoming_check_ins,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let reservations = {
        let db = state.db.lock().unwrap();
        queries::get_all_reservations(&db, query.status.as_deref(), limit)?
    };

    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}
