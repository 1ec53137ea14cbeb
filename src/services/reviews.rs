use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{ReservationStatus, Review};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("only the guest of the stay may leave a review")]
    NotGuest,

    #[error("the stay has not been completed")]
    StayNotCompleted,

    #[error("this reservation has already been reviewed")]
    AlreadyReviewed,

    #[error("rating must be between 1 and 5")]
    InvalidRating,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A review is admitted only for a completed stay, only by its guest,
/// and only once per reservation.
pub fn submit_review(
    conn: &mut Connection,
    reservation_id: &str,
    actor_id: &str,
    rating: i32,
    comment: Option<&str>,
) -> Result<Review, ReviewError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::InvalidRating);
    }

    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let reservation = queries::get_reservation(&tx, reservation_id)?
        .ok_or_else(|| ReviewError::ReservationNotFound(reservation_id.to_string()))?;

    if reservation.guest_id != actor_id {
        return Err(ReviewError::NotGuest);
    }
    if reservation.status != ReservationStatus::Completed {
        return Err(ReviewError::StayNotCompleted);
    }
    if queries::get_review_for_reservation(&tx, reservation_id)?.is_some() {
        return Err(ReviewError::AlreadyReviewed);
    }

    let review = Review {
        id: Uuid::new_v4().to_string(),
        property_id: reservation.property_id,
        reservation_id: reservation_id.to_string(),
        guest_id: reservation.guest_id,
        rating,
        comment: comment.map(str::to_string),
        created_at: Utc::now().naive_utc(),
    };

    queries::create_review(&tx, &review)?;
    tx.commit().map_err(anyhow::Error::from)?;

    Ok(review)
}
