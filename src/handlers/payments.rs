use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PaymentRecord, PaymentStatus, ReservationStatus};
use crate::services::booking::{self, PaymentOutcome};
use crate::services::payments::{GatewayOrderStatus, OrderRequest};
use crate::state::AppState;

use super::bookings::ReservationResponse;
use super::require_actor;

// POST /api/bookings/:id/payment
#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub payment_session_id: String,
    pub amount: i64,
    pub currency: String,
}

pub async fn create_payment_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    // Snapshot what the gateway call needs, then release the lock before
    // awaiting the provider.
    let (amount, currency, guest_id) = {
        let db = state.db.lock().unwrap();
        let reservation = queries::get_reservation(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?;

        if !actor.is_admin && actor.id != reservation.guest_id {
            return Err(AppError::Forbidden);
        }
        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::Validation(
                "payment can only be collected for a pending reservation".into(),
            ));
        }
        if reservation.payment.is_some() {
            return Err(AppError::Validation(
                "a payment order already exists for this reservation".into(),
            ));
        }

        (
            reservation.pricing.total,
            reservation.pricing.currency,
            reservation.guest_id,
        )
    };

    let order_request = OrderRequest {
        order_id: format!("order_{}", Uuid::new_v4().simple()),
        amount,
        currency: currency.clone(),
        customer_id: guest_id,
    };

    let order = state
        .payments
        .create_order(&order_request)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        let record = PaymentRecord {
            order_id: order.order_id.clone(),
            status: PaymentStatus::Created,
            updated_at: Utc::now().naive_utc(),
        };
        queries::update_payment_record(&db, &id, &record)?;
    }

    tracing::info!(reservation_id = %id, order_id = %order.order_id, "payment order created");

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            order_id: order.order_id,
            payment_session_id: order.payment_session_id,
            amount,
            currency,
        }),
    ))
}

// POST /api/bookings/:id/payment/sync
pub async fn sync_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let order_id = {
        let db = state.db.lock().unwrap();
        let reservation = queries::get_reservation(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?;

        if !actor.is_admin && actor.id != reservation.guest_id && actor.id != reservation.host_id {
            return Err(AppError::Forbidden);
        }

        reservation
            .payment
            .map(|p| p.order_id)
            .ok_or_else(|| AppError::Validation("reservation has no payment order".into()))?
    };

    let gateway_status = state
        .payments
        .fetch_order_status(&order_id)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    let reservation = {
        let mut db = state.db.lock().unwrap();
        match gateway_status {
            GatewayOrderStatus::Paid => {
                booking::settle_payment(&mut db, &id, PaymentOutcome::Paid)?
            }
            GatewayOrderStatus::Expired => {
                booking::settle_payment(&mut db, &id, PaymentOutcome::Failed)?
            }
            GatewayOrderStatus::Active => queries::get_reservation(&db, &id)?
                .ok_or_else(|| AppError::NotFound(format!("reservation {id}")))?,
        }
    };

    Ok(Json(reservation.into()))
}
