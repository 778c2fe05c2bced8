//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::SharedState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_handler))
        // Session API
        .route("/api/session", get(handlers::session::get_session_handler))
        .route(
            "/api/session/connect",
            post(handlers::session::connect_handler),
        )
        .route(
            "/api/session/disconnect",
            post(handlers::session::disconnect_handler),
        )
        .route(
            "/api/session/switch",
            post(handlers::session::switch_handler),
        )
        .route(
            "/api/session/logout",
            post(handlers::session::logout_handler),
        )
        // Profiles API
        .route(
            "/api/profiles",
            post(handlers::profiles::create_profile_handler),
        )
        .route(
            "/api/profiles/:wallet",
            get(handlers::profiles::list_wallet_profiles_handler),
        )
        // Feed API
        .route(
            "/api/feed",
            get(handlers::feed::list_feed_handler).post(handlers::feed::create_post_handler),
        )
        .route("/api/feed/:post_id", get(handlers::feed::get_post_handler))
        .route(
            "/api/feed/:post_id/comments",
            get(handlers::feed::list_comments_handler)
                .post(handlers::feed::create_comment_handler),
        )
        // Reactions API
        .route(
            "/api/feed/:post_id/react",
            post(handlers::reactions::react_handler),
        )
        .route(
            "/api/feed/:post_id/reactions",
            get(handlers::reactions::list_reactions_handler),
        )
        .with_state(state)
}
