//! Profile handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::profile::{NewProfile, Profile};
use crate::store::StoreError;
use crate::wallet::{is_valid_address, normalize_address};
use crate::web::state::SharedState;
use crate::web::utils::{api_error, now_secs};

pub async fn list_wallet_profiles_handler(
    State(state): State<SharedState>,
    Path(wallet): Path<String>,
) -> Response {
    if !is_valid_address(&wallet) {
        return api_error(StatusCode::BAD_REQUEST, "invalid wallet address");
    }

    let store = Arc::clone(&state.lock().await.store);
    match store.profiles_by_wallet(&normalize_address(&wallet)) {
        Ok(profiles) => (StatusCode::OK, axum::Json(profiles)).into_response(),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

/// Create a profile from the creation-form submission and invalidate the
/// wallet's cached snapshot so the next resolve sees it.
pub async fn create_profile_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<NewProfile>,
) -> Response {
    let profile = match Profile::from_new(req, now_secs()) {
        Ok(p) => p,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let store = Arc::clone(&state.lock().await.store);

    // Pre-check for a friendlier message; the store's constraint is
    // authoritative either way.
    match store.profile_by_username(&profile.account_id, &profile.username) {
        Ok(Some(_)) => {
            return api_error(
                StatusCode::CONFLICT,
                format!("username {} already taken", profile.username),
            )
        }
        Ok(None) => {}
        Err(e) => return api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }

    match store.insert_profile(&profile) {
        Ok(()) => {
            let mut st = state.lock().await;
            st.session.invalidate_wallet(&profile.wallet_address);
            (StatusCode::CREATED, axum::Json(profile)).into_response()
        }
        Err(StoreError::Conflict(msg)) => api_error(StatusCode::CONFLICT, msg),
        Err(e) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}
