//! Shared utility functions for the web layer.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::events::EventWithRelations;
use crate::storage::{EventRow, UserRow};
use crate::web::state::AppState;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Map an application error onto its HTTP status. Internal failures are not
/// echoed to the client beyond their kind.
pub fn app_error(err: &AppError) -> Response {
    let status = match err {
        AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Authorization(_) => StatusCode::UNAUTHORIZED,
        AppError::Configuration(_) | AppError::Storage(_) | AppError::Photo(_) => {
            crate::mlog!("internal error: {}", err);
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
            );
        }
    };
    api_error(status, err.to_string())
}

/// Extract the bearer token from the Authorization header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the calling user from the request headers, or produce the 401
/// response to return instead.
pub fn require_viewer(state: &AppState, headers: &HeaderMap) -> Result<UserRow, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "missing bearer token",
        ));
    };
    match crate::auth::resolve_token(&state.storage, token) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(api_error(StatusCode::UNAUTHORIZED, "invalid token")),
        Err(e) => Err(app_error(&e)),
    }
}

/// Like [`require_viewer`], but additionally requires the admin role.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<UserRow, Response> {
    let user = require_viewer(state, headers)?;
    if user.role != crate::auth::ROLE_ADMIN {
        return Err(api_error(StatusCode::UNAUTHORIZED, "admin role required"));
    }
    Ok(user)
}

/// Public projection of a user — never includes credential material.
pub fn user_to_json(u: &UserRow) -> serde_json::Value {
    serde_json::json!({
        "id": u.user_id,
        "name": u.name,
        "email": u.email,
        "role": u.role,
        "verified_at": u.verified_at,
    })
}

pub fn event_to_json(e: &EventRow) -> serde_json::Value {
    serde_json::json!({
        "id": e.event_id,
        "owner_id": e.owner_id,
        "name": e.name,
        "category": e.category,
        "time": e.starts_at,
        "duration": e.duration_mins,
        "location": e.location,
        "coordinate_lat": e.coordinate_lat,
        "coordinate_lon": e.coordinate_lon,
        "privacy": e.privacy,
        "max_participants": e.max_participants,
        "photo_url": e.photo_url,
        "remarks": e.remarks,
        "created_at": e.created_at,
        "updated_at": e.updated_at,
    })
}

pub fn event_with_relations_to_json(ev: &EventWithRelations) -> serde_json::Value {
    let mut json = event_to_json(&ev.event);
    json["owner"] = user_to_json(&ev.owner);
    json["participants"] = serde_json::Value::Array(
        ev.participants.iter().map(user_to_json).collect(),
    );
    json
}

/// Current time as seconds since UNIX epoch.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
