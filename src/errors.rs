use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::booking::BookingError;
use crate::services::reviews::ReviewError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(e) => match e {
                BookingError::PropertyNotFound(_) | BookingError::ReservationNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                BookingError::Unavailable(_) | BookingError::CapacityExceeded { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                BookingError::DateConflict | BookingError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
                BookingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                BookingError::Database(_) | BookingError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Review(e) => match e {
                ReviewError::ReservationNotFound(_) => StatusCode::NOT_FOUND,
                ReviewError::NotGuest => StatusCode::FORBIDDEN,
                ReviewError::StayNotCompleted | ReviewError::AlreadyReviewed => {
                    StatusCode::CONFLICT
                }
                ReviewError::InvalidRating => StatusCode::BAD_REQUEST,
                ReviewError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            let body = serde_json::json!({ "error": "internal error" });
            return (status, axum::Json(body)).into_response();
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
