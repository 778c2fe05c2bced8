//! Shared utility functions for the web server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::feed::{self, Post};
use crate::session::Session;
use crate::store::CommunityStore;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Current time as seconds since UNIX epoch.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// JSON view of the current identity state.
pub fn session_json(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "wallet_address": session.wallet(),
        "profiles": session.profiles(),
        "active_profile": session.active_profile(),
        "loading": session.is_loading(),
    })
}

/// JSON view of a post including its derived reaction counts and comment
/// count.
pub fn post_json(post: &Post, store: &dyn CommunityStore) -> serde_json::Value {
    let counts = feed::reaction_counts(store, &post.id).unwrap_or_default();
    let comment_count = store
        .comments_for(&post.id)
        .map(|c| c.len())
        .unwrap_or_default();

    serde_json::json!({
        "id": post.id,
        "author_profile_id": post.author_profile_id,
        "body": post.body,
        "created_at": post.created_at,
        "reactions": counts,
        "comment_count": comment_count,
    })
}
