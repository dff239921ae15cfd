//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.lock().await;
    let photo_storage = if state.photo_dir.is_some() {
        "local"
    } else {
        "remote"
    };

    let body = serde_json::json!({
        "status": "ok",
        "photo_storage": photo_storage,
    });
    (StatusCode::OK, axum::Json(body))
}
