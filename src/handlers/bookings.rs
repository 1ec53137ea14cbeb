use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{GuestCounts, PricingSnapshot, Reservation, ReservationStatus};
use crate::services::booking::{self, BookingRequest};
use crate::state::AppState;

use super::require_actor;

#[derive(Serialize)]
pub struct ReservationResponse {
    pub id: String,
    pub property_id: String,
    pub guest_id: String,
    pub host_id: String,
    pub check_in: String,
    pub check_out: String,
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
    pub status: String,
    pub special_requests: Option<String>,
    pub pricing: PricingSnapshot,
    pub payment: Option<PaymentView>,
    pub cancellation: Option<CancellationView>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct PaymentView {
    pub order_id: String,
    pub status: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CancellationView {
    pub cancelled_by: String,
    pub cancelled_at: String,
    pub reason: Option<String>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        ReservationResponse {
            id: r.id,
            property_id: r.property_id,
            guest_id: r.guest_id,
            host_id: r.host_id,
            check_in: r.check_in.format("%Y-%m-%d").to_string(),
            check_out: r.check_out.format("%Y-%m-%d").to_string(),
            adults: r.guests.adults,
            children: r.guests.children,
            infants: r.guests.infants,
            status: r.status.as_str().to_string(),
            special_requests: r.special_requests,
            pricing: r.pricing,
            payment: r.payment.map(|p| PaymentView {
                order_id: p.order_id,
                status: p.status.as_str().to_string(),
                updated_at: p.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            }),
            cancellation: r.cancellation.map(|c| CancellationView {
                cancelled_by: c.cancelled_by,
                cancelled_at: c.cancelled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                reason: c.reason,
            }),
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: r.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub property_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    #[serde(default)]
    pub infants: i32,
    pub special_requests: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let request = BookingRequest {
        property_id: body.property_id,
        guest_id: actor.id,
        check_in: body.check_in,
        check_out: body.check_out,
        guests: GuestCounts {
            adults: body.adults,
            children: body.children,
            infants: body.infants,
        },
        special_requests: body.special_requests,
    };
    request.validate(Utc::now().date_naive())?;

    let reservation = {
        let mut db = state.db.lock().unwrap();
        booking::request_booking(&mut db, &request)?
    };

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let reservation = {
        let db = state.db.lock().unwrap();
        queries::get_reservation(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?;

    if !actor.is_admin && actor.id != reservation.guest_id && actor.id != reservation.host_id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(reservation.into()))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct ListQuery {
    pub role: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let reservations = {
        let db = state.db.lock().unwrap();
        match query.role.as_deref() {
            Some("host") => queries::list_reservations_for_host(&db, &actor.id)?,
            _ => queries::list_reservations_for_guest(&db, &actor.id)?,
        }
    };

    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelBody>,
) -> Result<Json<ReservationResponse>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let reservation = {
        let mut db = state.db.lock().unwrap();
        booking::cancel_reservation(&mut db, &id, &actor, body.reason.as_deref())?
    };

    Ok(Json(reservation.into()))
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct TransitionBody {
    pub status: ReservationStatus,
    pub reason: Option<String>,
}

pub async fn set_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<ReservationResponse>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let reservation = {
        let mut db = state.db.lock().unwrap();
        booking::transition_status(&mut db, &id, body.status, &actor, body.reason.as_deref())?
    };

    Ok(Json(reservation.into()))
}
