//! Event handlers: create, update, read, delete, plus local photo serving.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::events::{self, EventDraft};
use crate::web::state::SharedState;
use crate::web::utils::{
    api_error, app_error, event_to_json, event_with_relations_to_json, require_viewer,
};

/// Event upsert body: the draft fields, plus the target id for updates.
#[derive(Deserialize)]
pub struct UpsertPayload {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub draft: EventDraft,
}

#[derive(Deserialize)]
pub struct DeletePayload {
    id: i64,
}

pub async fn create_event_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<UpsertPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match events::create(&st.storage, st.photos.as_ref(), user.user_id, &req.draft) {
        Ok(event) => (StatusCode::CREATED, axum::Json(event_to_json(&event))).into_response(),
        Err(e) => app_error(&e),
    }
}

pub async fn update_event_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<UpsertPayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let Some(event_id) = req.id else {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, "missing event id");
    };

    match events::update(
        &st.storage,
        st.photos.as_ref(),
        user.user_id,
        event_id,
        &req.draft,
    ) {
        Ok(event) => (StatusCode::OK, axum::Json(event_to_json(&event))).into_response(),
        Err(e) => app_error(&e),
    }
}

pub async fn get_event_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match events::get(&st.storage, user.user_id, event_id) {
        Ok(loaded) => (
            StatusCode::OK,
            axum::Json(event_with_relations_to_json(&loaded)),
        )
            .into_response(),
        Err(e) => app_error(&e),
    }
}

pub async fn delete_event_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<DeletePayload>,
) -> Response {
    let st = state.lock().await;
    let user = match require_viewer(&st, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match events::delete(&st.storage, user.user_id, req.id) {
        Ok(()) => (StatusCode::OK, axum::Json(serde_json::json!({}))).into_response(),
        Err(e) => app_error(&e),
    }
}

/// Serve a locally stored photo. Only active when photos live on disk.
pub async fn get_photo_handler(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Response {
    // No path components: photo keys are hex plus an extension.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return api_error(StatusCode::BAD_REQUEST, "invalid photo name");
    }

    let st = state.lock().await;
    let Some(ref dir) = st.photo_dir else {
        return api_error(StatusCode::NOT_FOUND, "photo not found");
    };

    let path = dir.join(&filename);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let content_type = match path.extension().and_then(|e| e.to_str()) {
                Some("png") => "image/png",
                Some("gif") => "image/gif",
                Some("webp") => "image/webp",
                Some("jpg") | Some("jpeg") => "image/jpeg",
                _ => "application/octet-stream",
            };
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(_) => api_error(StatusCode::NOT_FOUND, "photo not found"),
    }
}
