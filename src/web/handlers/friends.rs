//! Friendship handlers: list, request, accept, remove.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::friends;
use crate::storage::Storage;
use crate::web::state::SharedState;
use crate::web::utils::{app_error, require_viewer, user_to_json};

/// The other party of the friendship operation.
#[derive(Deserialize)]
pub struct FriendPayload {
    id: i64,
}

fn users_to_json(storage: &Storage, ids: &[i64]) -> Result<Vec<serde_json::Value>, Response> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        match storage.get_user(id) {
            Ok(Some(user)) => out.push(user_to_json(&user)),
            // An edge may outlive a deleted account; skip the projection.
            Ok(None) => {}
            Err(e) => return Err(app_error(&e.into())),
        }
    }
    Ok(out)
}

/// Accepted friends plus pending requests in both directions.
pub async fn list_friends_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let overview = match friends::overview(&st.storage, user.user_id) {
        Ok(overview) => overview,
        Err(e) => return app_error(&e),
    };

    let friends = match users_to_json(&st.storage, &overview.friends) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let incoming = match users_to_json(&st.storage, &overview.incoming_pending) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let outgoing = match users_to_json(&st.storage, &overview.outgoing_pending) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let json = serde_json::json!({
        "friends": friends,
        "incoming_pending": incoming,
        "outgoing_pending": outgoing,
    });
    (StatusCode::OK, axum::Json(json)).into_response()
}

pub async fn request_friend_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<FriendPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    // The target must be a real account; otherwise requests could pile up
    // against arbitrary ids.
    match st.storage.get_user(req.id) {
        Ok(Some(_)) => {}
        Ok(None) => return app_error(&crate::error::AppError::NotFound(format!("user {}", req.id))),
        Err(e) => return app_error(&e.into()),
    }

    match friends::request(&st.storage, user.user_id, req.id) {
        Ok(row) => {
            let json = serde_json::json!({
                "id": row.friendship_id,
                "status": row.status,
                "requester_id": row.requester_id,
            });
            (StatusCode::CREATED, axum::Json(json)).into_response()
        }
        Err(e) => app_error(&e),
    }
}

pub async fn accept_friend_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<FriendPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match friends::accept(&st.storage, user.user_id, req.id) {
        Ok(row) => {
            let json = serde_json::json!({
                "id": row.friendship_id,
                "status": row.status,
            });
            (StatusCode::OK, axum::Json(json)).into_response()
        }
        Err(e) => app_error(&e),
    }
}

pub async fn remove_friend_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<FriendPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match friends::remove(&st.storage, user.user_id, req.id) {
        Ok(()) => (StatusCode::OK, axum::Json(serde_json::json!({}))).into_response(),
        Err(e) => app_error(&e),
    }
}
