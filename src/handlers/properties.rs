use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries::{self, PropertyFilter};
use crate::errors::AppError;
use crate::models::Property;
use crate::state::AppState;

use super::require_actor;

#[derive(Serialize)]
pub struct PropertyResponse {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub city: String,
    pub accommodates: i32,
    pub base_price: i64,
    pub cleaning_fee: i64,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Property> for PropertyResponse {
    fn from(p: Property) -> Self {
        PropertyResponse {
            id: p.id,
            host_id: p.host_id,
            title: p.title,
            city: p.city,
            accommodates: p.accommodates,
            base_price: p.base_price,
            cleaning_fee: p.cleaning_fee,
            is_active: p.is_active,
            created_at: p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/properties
#[derive(Deserialize)]
pub struct CreatePropertyRequest {
    pub title: String,
    pub city: String,
    pub accommodates: i32,
    pub base_price: i64,
    #[serde(default)]
    pub cleaning_fee: i64,
}

pub async fn create_property(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyResponse>), AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    if req.title.trim().is_empty() || req.city.trim().is_empty() {
        return Err(AppError::Validation("title and city are required".into()));
    }
    if req.accommodates < 1 {
        return Err(AppError::Validation(
            "accommodates must be at least 1".into(),
        ));
    }
    if req.base_price < 0 || req.cleaning_fee < 0 {
        return Err(AppError::Validation("prices must not be negative".into()));
    }

    let now = Utc::now().naive_utc();
    let property = Property {
        id: Uuid::new_v4().to_string(),
        host_id: actor.id,
        title: req.title.trim().to_string(),
        city: req.city.trim().to_string(),
        accommodates: req.accommodates,
        base_price: req.base_price,
        cleaning_fee: req.cleaning_fee,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_property(&db, &property)?;
    }

    Ok((StatusCode::CREATED, Json(property.into())))
}

// GET /api/properties
#[derive(Deserialize)]
pub struct SearchQuery {
    pub city: Option<String>,
    pub guests: Option<i32>,
    pub max_price: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn search_properties(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PropertyResponse>>, AppError> {
    let filter = PropertyFilter {
        city: query.city,
        guests: query.guests,
        max_price: query.max_price,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let properties = {
        let db = state.db.lock().unwrap();
        queries::search_properties(&db, &filter, limit)?
    };

    Ok(Json(properties.into_iter().map(Into::into).collect()))
}

// GET /api/properties/:id
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>, AppError> {
    let property = {
        let db = state.db.lock().unwrap();
        queries::get_property(&db, &id)?
    };

    match property {
        Some(property) => Ok(Json(property.into())),
        None => Err(AppError::NotFound(format!("property {id}"))),
    }
}

// POST /api/properties/:id/deactivate
pub async fn deactivate_property(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let property =
        queries::get_property(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("property {id}")))?;

    if !actor.is_admin && actor.id != property.host_id {
        return Err(AppError::Forbidden);
    }

    queries::set_property_active(&db, &id, false)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
