pub mod admin;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod properties;
pub mod reviews;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::services::booking::Actor;

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Identity is resolved by an upstream auth layer; handlers trust the
/// x-actor-id header it sets. Administrative privilege is the bearer
/// token from the config.
pub(crate) fn require_actor(headers: &HeaderMap, admin_token: &str) -> Result<Actor, AppError> {
    let is_admin = bearer_token(headers)
        .map(|t| !admin_token.is_empty() && t == admin_token)
        .unwrap_or(false);

    let id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if id.is_empty() {
        if is_admin {
            return Ok(Actor {
                id: "admin".to_string(),
                is_admin: true,
            });
        }
        return Err(AppError::Unauthorized);
    }

    Ok(Actor {
        id: id.to_string(),
        is_admin,
    })
}
