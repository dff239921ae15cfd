//! Admin user-management handlers. All require the admin role.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::AppError;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, app_error, now_secs, require_admin, user_to_json};

#[derive(Deserialize)]
pub struct LookupQuery {
    email: String,
}

#[derive(Deserialize)]
pub struct UpdateUserPayload {
    id: i64,
    name: String,
    email: String,
    role: String,
    verified: bool,
}

#[derive(Deserialize)]
pub struct DeleteUserPayload {
    id: i64,
}

pub async fn get_user_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<LookupQuery>,
) -> Response {
    let st = state.lock().await;
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }

    match st.storage.get_user_by_email(&query.email) {
        Ok(Some(user)) => (StatusCode::OK, axum::Json(user_to_json(&user))).into_response(),
        Ok(None) => app_error(&AppError::NotFound(format!("user {}", query.email))),
        Err(e) => app_error(&e.into()),
    }
}

pub async fn update_user_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<UpdateUserPayload>,
) -> Response {
    let st = state.lock().await;
    if let Err(resp) = require_admin(&st, &headers) {
        return resp;
    }

    if req.role != crate::auth::ROLE_ORDINARY && req.role != crate::auth::ROLE_ADMIN {
        return api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unknown role '{}'", req.role),
        );
    }

    // Keep an existing verification timestamp; stamp a fresh one when the
    // admin flips an unverified account to verified.
    let verified_at = match st.storage.get_user(req.id) {
        Ok(Some(user)) if req.verified => user.verified_at.or(Some(now_secs())),
        Ok(Some(_)) => None,
        Ok(None) => return app_error(&AppError::NotFound(format!("user {}", req.id))),
        Err(e) => return app_error(&e.into()),
    };

    if let Err(e) = st
        .storage
        .update_user(req.id, &req.name, &req.email, &req.role, verified_at)
    {
        return app_error(&e.into());
    }

    match st.storage.get_user(req.id) {
        Ok(Some(user)) => (StatusCode::OK, axum::Json(user_to_json(&user))).into_response(),
        Ok(None) => app_error(&AppError::NotFound(format!("user {}", req.id))),
        Err(e) => app_error(&e.into()),
    }
}

pub async fn delete_user_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<DeleteUserPayload>,
) -> Response {
    let st = state.lock().await;
    let admin = match require_admin(&st, &headers) {
        Ok(admin) => admin,
        Err(resp) => return resp,
    };

    if admin.user_id == req.id {
        return api_error(
            StatusCode::CONFLICT,
            "admins cannot delete their own account",
        );
    }

    match st.storage.delete_user(req.id) {
        Ok(true) => {
            crate::mlog!(
                "admin: {} deleted user {}",
                crate::logging::user_id(admin.user_id),
                crate::logging::user_id(req.id)
            );
            (StatusCode::OK, axum::Json(serde_json::json!({}))).into_response()
        }
        Ok(false) => app_error(&AppError::NotFound(format!("user {}", req.id))),
        Err(e) => app_error(&e.into()),
    }
}
