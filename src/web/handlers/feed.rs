//! Feed handlers: posts and comments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::feed::{Comment, Post};
use crate::web::config::DEFAULT_FEED_LIMIT;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, now_secs, post_json};

pub async fn list_feed_handler(State(state): State<SharedState>) -> Response {
    let store = Arc::clone(&state.lock().await.store);
    match store.posts(DEFAULT_FEED_LIMIT) {
        Ok(posts) => {
            let items: Vec<serde_json::Value> =
                posts.iter().map(|p| post_json(p, store.as_ref())).collect();
            (StatusCode::OK, axum::Json(serde_json::json!({ "posts": items }))).into_response()
        }
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub async fn get_post_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
) -> Response {
    let store = Arc::clone(&state.lock().await.store);
    match store.post(&post_id) {
        Ok(Some(post)) => {
            (StatusCode::OK, axum::Json(post_json(&post, store.as_ref()))).into_response()
        }
        Ok(None) => api_error(StatusCode::NOT_FOUND, "post not found"),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    body: String,
}

/// Posting requires an active profile; the post is attributed to it.
pub async fn create_post_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<CreatePostRequest>,
) -> Response {
    let (store, author) = {
        let st = state.lock().await;
        let Some(profile) = st.session.active_profile() else {
            return api_error(StatusCode::UNAUTHORIZED, "no active profile");
        };
        (Arc::clone(&st.store), profile.id.clone())
    };

    let post = match Post::new(author, req.body, now_secs()) {
        Ok(p) => p,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match store.insert_post(&post) {
        Ok(()) => {
            (StatusCode::CREATED, axum::Json(post_json(&post, store.as_ref()))).into_response()
        }
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub async fn list_comments_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
) -> Response {
    let store = Arc::clone(&state.lock().await.store);
    match store.comments_for(&post_id) {
        Ok(comments) => (StatusCode::OK, axum::Json(comments)).into_response(),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    body: String,
}

pub async fn create_comment_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
    axum::Json(req): axum::Json<CreateCommentRequest>,
) -> Response {
    let (store, author) = {
        let st = state.lock().await;
        let Some(profile) = st.session.active_profile() else {
            return api_error(StatusCode::UNAUTHORIZED, "no active profile");
        };
        (Arc::clone(&st.store), profile.id.clone())
    };

    match store.post(&post_id) {
        Ok(Some(_)) => {}
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "post not found"),
        Err(e) => return api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }

    let comment = match Comment::new(post_id, author, req.body, now_secs()) {
        Ok(c) => c,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match store.insert_comment(&comment) {
        Ok(()) => (StatusCode::CREATED, axum::Json(comment)).into_response(),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}
