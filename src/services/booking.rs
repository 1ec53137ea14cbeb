use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::db::queries;
use crate::models::{
    CancellationRecord, GuestCounts, PaymentStatus, Reservation, ReservationStatus,
};
use crate::services::pricing;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    #[error("reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("property {0} is not currently accepting bookings")]
    Unavailable(String),

    #[error("party of {requested} exceeds the property capacity of {limit}")]
    CapacityExceeded { requested: i32, limit: i32 },

    #[error("requested dates overlap an existing reservation")]
    DateConflict,

    #[error("cannot move a reservation from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("actor {0} may not perform this action on the reservation")]
    Forbidden(String),

    #[error("invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A booking request that has passed boundary validation. Built from the
/// HTTP request body after `validate` succeeds.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub property_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: GuestCounts,
    pub special_requests: Option<String>,
}

impl BookingRequest {
    /// Boundary checks that need no store access. `today` is passed in so
    /// callers and tests control the clock.
    pub fn validate(&self, today: NaiveDate) -> Result<(), BookingError> {
        if self.check_in >= self.check_out {
            return Err(BookingError::InvalidRequest(
                "check_in must be before check_out".into(),
            ));
        }
        if self.check_in < today {
            return Err(BookingError::InvalidRequest(
                "check_in must not be in the past".into(),
            ));
        }
        if self.guests.adults < 1 {
            return Err(BookingError::InvalidRequest(
                "at least one adult is required".into(),
            ));
        }
        if self.guests.children < 0 || self.guests.infants < 0 {
            return Err(BookingError::InvalidRequest(
                "guest counts must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }
}

/// Admission control: capacity check, overlap check, pricing, insert.
///
/// The read-check-insert sequence runs inside a single IMMEDIATE transaction
/// so the overlap query and the insert hold the SQLite write lock as one
/// unit. Combined with the process-wide connection mutex, two concurrent
/// requests for overlapping dates resolve to one acceptance and one
/// `DateConflict`.
pub fn request_booking(
    conn: &mut Connection,
    req: &BookingRequest,
) -> Result<Reservation, BookingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let property = queries::get_property(&tx, &req.property_id)?
        .ok_or_else(|| BookingError::PropertyNotFound(req.property_id.clone()))?;

    if !property.is_active {
        return Err(BookingError::Unavailable(property.id));
    }

    let requested = req.guests.total();
    if requested > property.accommodates {
        return Err(BookingError::CapacityExceeded {
            requested,
            limit: property.accommodates,
        });
    }

    if queries::has_overlapping_reservation(&tx, &property.id, req.check_in, req.check_out)? {
        return Err(BookingError::DateConflict);
    }

    let nights = pricing::nights_between(req.check_in, req.check_out);
    let quote = pricing::compute_pricing(property.base_price, nights, property.cleaning_fee);

    let now = Utc::now().naive_utc();
    let reservation = Reservation {
        id: Uuid::new_v4().to_string(),
        property_id: property.id,
        guest_id: req.guest_id.clone(),
        host_id: property.host_id,
        check_in: req.check_in,
        check_out: req.check_out,
        guests: req.guests,
        status: ReservationStatus::Pending,
        special_requests: req.special_requests.clone(),
        pricing: quote,
        payment: None,
        cancellation: None,
        created_at: now,
        updated_at: now,
    };

    queries::create_reservation(&tx, &reservation)?;
    tx.commit()?;

    Ok(reservation)
}

/// Apply a guest/host/admin-requested status change. Validation happens
/// before any write: party membership, then the transition table, then
/// role fit for the requested status.
pub fn transition_status(
    conn: &mut Connection,
    reservation_id: &str,
    requested: ReservationStatus,
    actor: &Actor,
    reason: Option<&str>,
) -> Result<Reservation, BookingError> {
    let tx = conn.transaction()?;

    let mut reservation = queries::get_reservation(&tx, reservation_id)?
        .ok_or_else(|| BookingError::ReservationNotFound(reservation_id.to_string()))?;

    if !actor.is_admin && actor.id != reservation.guest_id && actor.id != reservation.host_id {
        return Err(BookingError::Forbidden(actor.id.clone()));
    }

    if !reservation.status.can_transition_to(requested) {
        return Err(BookingError::InvalidTransition {
            from: reservation.status,
            to: requested,
        });
    }

    if !actor.is_admin {
        let role_fits = match requested {
            ReservationStatus::CancelledByGuest => actor.id == reservation.guest_id,
            ReservationStatus::CancelledByHost => actor.id == reservation.host_id,
            ReservationStatus::Confirmed
            | ReservationStatus::Completed
            | ReservationStatus::NoShow => actor.id == reservation.host_id,
            ReservationStatus::Pending | ReservationStatus::PaymentFailed => false,
        };
        if !role_fits {
            return Err(BookingError::Forbidden(actor.id.clone()));
        }
    }

    let cancellation = if requested.is_cancellation() {
        Some(CancellationRecord {
            cancelled_by: actor.id.clone(),
            cancelled_at: Utc::now().naive_utc(),
            reason: reason.map(str::to_string),
        })
    } else {
        None
    };

    queries::update_reservation_status(&tx, reservation_id, requested, cancellation.as_ref())?;
    tx.commit()?;

    reservation.status = requested;
    reservation.cancellation = cancellation;
    Ok(reservation)
}

/// Cancel on behalf of whichever side the actor is on. Admins cancel as
/// the host side.
pub fn cancel_reservation(
    conn: &mut Connection,
    reservation_id: &str,
    actor: &Actor,
    reason: Option<&str>,
) -> Result<Reservation, BookingError> {
    let requested = {
        let reservation = queries::get_reservation(conn, reservation_id)?
            .ok_or_else(|| BookingError::ReservationNotFound(reservation_id.to_string()))?;

        if actor.id == reservation.guest_id {
            ReservationStatus::CancelledByGuest
        } else if actor.id == reservation.host_id || actor.is_admin {
            ReservationStatus::CancelledByHost
        } else {
            return Err(BookingError::Forbidden(actor.id.clone()));
        }
    };

    transition_status(conn, reservation_id, requested, actor, reason)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

/// Settlement path driven by the payment collaborator: a paid order
/// confirms a pending reservation, a failed one moves it to
/// payment_failed. This is the only way into payment_failed; the
/// guest/host transition table does not reach it.
pub fn settle_payment(
    conn: &mut Connection,
    reservation_id: &str,
    outcome: PaymentOutcome,
) -> Result<Reservation, BookingError> {
    let tx = conn.transaction()?;

    let mut reservation = queries::get_reservation(&tx, reservation_id)?
        .ok_or_else(|| BookingError::ReservationNotFound(reservation_id.to_string()))?;

    let next = match outcome {
        PaymentOutcome::Paid => ReservationStatus::Confirmed,
        PaymentOutcome::Failed => ReservationStatus::PaymentFailed,
    };

    if reservation.status != ReservationStatus::Pending {
        return Err(BookingError::InvalidTransition {
            from: reservation.status,
            to: next,
        });
    }

    let mut payment = reservation.payment.take().ok_or_else(|| {
        BookingError::InvalidRequest("reservation has no payment order".into())
    })?;
    payment.status = match outcome {
        PaymentOutcome::Paid => PaymentStatus::Paid,
        PaymentOutcome::Failed => PaymentStatus::Failed,
    };
    payment.updated_at = Utc::now().naive_utc();

    queries::update_payment_record(&tx, reservation_id, &payment)?;
    queries::update_reservation_status(&tx, reservation_id, next, None)?;
    tx.commit()?;

    reservation.status = next;
    reservation.payment = Some(payment);
    Ok(reservation)
}
