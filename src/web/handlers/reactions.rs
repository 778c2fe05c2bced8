//! Reaction handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::feed::{self, ReactionKind};
use crate::web::state::SharedState;
use crate::web::utils::{api_error, now_secs};

#[derive(Deserialize)]
pub struct ReactRequest {
    kind: String,
}

/// Toggle the active profile's reaction on a post and return the fresh
/// derived counts.
pub async fn react_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
    axum::Json(req): axum::Json<ReactRequest>,
) -> Response {
    let kind: ReactionKind = match req.kind.parse() {
        Ok(k) => k,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // Short lock: resolve the acting profile
    let (store, profile_id) = {
        let st = state.lock().await;
        let Some(profile) = st.session.active_profile() else {
            return api_error(StatusCode::UNAUTHORIZED, "no active profile");
        };
        (Arc::clone(&st.store), profile.id.clone())
    };
    // Lock released

    match store.post(&post_id) {
        Ok(Some(_)) => {}
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "post not found"),
        Err(e) => return api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }

    match feed::toggle_reaction(store.as_ref(), &post_id, &profile_id, kind, now_secs()) {
        Ok(outcome) => {
            let counts = feed::reaction_counts(store.as_ref(), &post_id).unwrap_or_default();
            let body = serde_json::json!({
                "status": outcome,
                "target_id": post_id,
                "kind": kind,
                "counts": counts,
            });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub async fn list_reactions_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
) -> Response {
    let (store, my_profile) = {
        let st = state.lock().await;
        (
            Arc::clone(&st.store),
            st.session.active_profile_id().map(str::to_string),
        )
    };

    let reactions = match store.reactions_for(&post_id) {
        Ok(r) => r,
        Err(e) => return api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    };

    let counts = feed::ReactionCounts::tally(&reactions);
    let mine: Vec<ReactionKind> = my_profile
        .as_deref()
        .map(|id| {
            reactions
                .iter()
                .filter(|r| r.profile_id == id)
                .map(|r| r.kind)
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<serde_json::Value> = reactions
        .iter()
        .map(|r| {
            serde_json::json!({
                "profile_id": r.profile_id,
                "kind": r.kind,
                "created_at": r.created_at,
            })
        })
        .collect();

    let body = serde_json::json!({
        "target_id": post_id,
        "counts": counts,
        "mine": mine,
        "reactions": rows,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
