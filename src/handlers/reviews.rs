use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Review;
use crate::services::reviews;
use crate::state::AppState;

use super::require_actor;

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub property_id: String,
    pub reservation_id: String,
    pub guest_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        ReviewResponse {
            id: r.id,
            property_id: r.property_id,
            reservation_id: r.reservation_id,
            guest_id: r.guest_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings/:id/review
#[derive(Deserialize)]
pub struct SubmitReviewBody {
    pub rating: i32,
    pub comment: Option<String>,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SubmitReviewBody>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let review = {
        let mut db = state.db.lock().unwrap();
        reviews::submit_review(&mut db, &id, &actor.id, body.rating, body.comment.as_deref())?
    };

    Ok((StatusCode::CREATED, Json(review.into())))
}

// GET /api/properties/:id/reviews
#[derive(Serialize)]
pub struct PropertyReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub average_rating: Option<f64>,
}

pub async fn list_property_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PropertyReviewsResponse>, AppError> {
    let db = state.db.lock().unwrap();

    if queries::get_property(&db, &id)?.is_none() {
        return Err(AppError::NotFound(format!("property {id}")));
    }

    let reviews = queries::list_reviews_for_property(&db, &id)?;
    let average_rating = queries::average_rating(&db, &id)?;

    Ok(Json(PropertyReviewsResponse {
        reviews: reviews.into_iter().map(Into::into).collect(),
        average_rating,
    }))
}
