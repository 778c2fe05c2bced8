//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let st = state.lock().await;

    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "store": st.store_descr,
        "wallet_connected": st.session.wallet().is_some(),
        "profiles": st.session.profiles().len(),
    });
    (StatusCode::OK, axum::Json(body))
}
