//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::web::config::MAX_EVENT_BODY_SIZE;
use crate::web::handlers;
use crate::web::state::SharedState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_handler))
        // User API
        .route("/api/user/register", post(handlers::users::register_handler))
        .route("/api/user/login", post(handlers::users::login_handler))
        .route("/api/user/logout", post(handlers::users::logout_handler))
        .route("/api/user", get(handlers::users::profile_handler))
        .route("/api/user/join", put(handlers::users::join_event_handler))
        // Admin API
        .route(
            "/api/admin",
            get(handlers::admin::get_user_handler)
                .put(handlers::admin::update_user_handler)
                .delete(handlers::admin::delete_user_handler),
        )
        // Friend API
        .route(
            "/api/friend",
            get(handlers::friends::list_friends_handler)
                .delete(handlers::friends::remove_friend_handler),
        )
        .route(
            "/api/friend/request",
            put(handlers::friends::request_friend_handler),
        )
        .route(
            "/api/friend/accept",
            put(handlers::friends::accept_friend_handler),
        )
        // Event API
        .route(
            "/api/event",
            post(handlers::events::create_event_handler)
                .put(handlers::events::update_event_handler)
                .delete(handlers::events::delete_event_handler)
                .layer(DefaultBodyLimit::max(MAX_EVENT_BODY_SIZE)),
        )
        .route(
            "/api/event/:event_id",
            get(handlers::events::get_event_handler),
        )
        // Locally stored photos
        .route("/photos/:filename", get(handlers::events::get_photo_handler))
        .with_state(state)
}
