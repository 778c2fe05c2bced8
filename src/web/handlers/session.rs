//! Session handlers: wallet connect/disconnect, profile switching, logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::session::CacheLookup;
use crate::wallet::is_valid_address;
use crate::wallet::WalletConnector;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, session_json};

pub async fn get_session_handler(State(state): State<SharedState>) -> Response {
    let st = state.lock().await;
    (StatusCode::OK, axum::Json(session_json(&st.session))).into_response()
}

#[derive(Deserialize)]
pub struct ConnectRequest {
    wallet_address: String,
}

/// Resolve the identity for a newly announced wallet address.
///
/// The lock is not held across the store round-trip; the commit is gated on
/// the resolution generation, so a response landing after the wallet changed
/// again is dropped instead of repopulating state for a stale wallet.
pub async fn connect_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<ConnectRequest>,
) -> Response {
    if !is_valid_address(&req.wallet_address) {
        return api_error(StatusCode::BAD_REQUEST, "invalid wallet address");
    }

    // Short lock: cache phase, snapshot the fetch parameters
    let (store, wallet, generation) = {
        let mut st = state.lock().await;
        st.connector.announce(req.wallet_address.clone());
        match st.session.resolve_cached(Some(&req.wallet_address)) {
            CacheLookup::Settled(_) => {
                return (StatusCode::OK, axum::Json(session_json(&st.session))).into_response();
            }
            CacheLookup::NeedsFetch { wallet, generation } => {
                (Arc::clone(&st.store), wallet, generation)
            }
        }
    };
    // Lock released

    let fetched = store.profiles_by_wallet(&wallet);

    // Short lock: gated commit
    let mut st = state.lock().await;
    match fetched {
        Ok(profiles) => {
            st.session.commit_profiles(&wallet, generation, profiles);
            (StatusCode::OK, axum::Json(session_json(&st.session))).into_response()
        }
        Err(e) => {
            st.session.fetch_failed(&wallet, generation);
            // Distinguishable from "no profile exists": the store could not
            // be asked.
            let body = serde_json::json!({
                "error": e.to_string(),
                "profile_unknown": true,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response()
        }
    }
}

pub async fn disconnect_handler(State(state): State<SharedState>) -> Response {
    let mut guard = state.lock().await;
    let st = &mut *guard;
    let _ = st.connector.disconnect();
    st.session.resolve_cached(None);
    (StatusCode::OK, axum::Json(session_json(&st.session))).into_response()
}

#[derive(Deserialize)]
pub struct SwitchRequest {
    profile_id: String,
}

/// Switch the active profile.  An unknown id is a fail-soft no-op: the
/// response reports `switched: false` and the session is unchanged.
pub async fn switch_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<SwitchRequest>,
) -> Response {
    let mut st = state.lock().await;
    let switched = st.session.switch_profile(&req.profile_id);
    let mut body = session_json(&st.session);
    body["switched"] = serde_json::Value::Bool(switched);
    (StatusCode::OK, axum::Json(body)).into_response()
}

pub async fn logout_handler(State(state): State<SharedState>) -> Response {
    let mut guard = state.lock().await;
    let st = &mut *guard;
    match st.session.logout(&mut st.connector) {
        Ok(()) => (StatusCode::OK, axum::Json(session_json(&st.session))).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
