//! Registration, login, profile, and event-join handlers.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth;
use crate::events;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, app_error, bearer_token, event_to_json, require_viewer, user_to_json};

#[derive(Deserialize)]
pub struct RegisterPayload {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct JoinPayload {
    id: i64,
}

pub async fn register_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<RegisterPayload>,
) -> Response {
    let st = state.lock().await;
    match auth::register(&st.storage, &req.name, &req.email, &req.password) {
        Ok((user, token)) => {
            let json = serde_json::json!({
                "token": token,
                "user": user_to_json(&user),
            });
            (StatusCode::CREATED, axum::Json(json)).into_response()
        }
        Err(e) => app_error(&e),
    }
}

pub async fn login_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<LoginPayload>,
) -> Response {
    let st = state.lock().await;
    match auth::login(&st.storage, &req.email, &req.password) {
        Ok((user, token)) => {
            let json = serde_json::json!({
                "token": token,
                "user": user_to_json(&user),
            });
            (StatusCode::OK, axum::Json(json)).into_response()
        }
        Err(e) => app_error(&e),
    }
}

pub async fn logout_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let st = state.lock().await;
    let Some(token) = bearer_token(&headers) else {
        return api_error(StatusCode::UNAUTHORIZED, "missing bearer token");
    };
    match auth::logout(&st.storage, token) {
        Ok(()) => (StatusCode::OK, axum::Json(serde_json::json!({}))).into_response(),
        Err(e) => app_error(&e),
    }
}

/// The caller's own profile plus the events they own.
pub async fn profile_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let events = match st.storage.list_events_by_owner(user.user_id) {
        Ok(events) => events,
        Err(e) => return app_error(&e.into()),
    };
    let json = serde_json::json!({
        "user": user_to_json(&user),
        "events": events.iter().map(event_to_json).collect::<Vec<_>>(),
    });
    (StatusCode::OK, axum::Json(json)).into_response()
}

pub async fn join_event_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<JoinPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match events::join(&st.storage, user.user_id, req.id) {
        Ok(event) => (StatusCode::OK, axum::Json(event_to_json(&event))).into_response(),
        Err(e) => app_error(&e),
    }
}
