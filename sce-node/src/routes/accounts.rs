//! `GET /accounts/:address/state` — `Engine::get_user_state` (spec.md §1
//! `GetUserState`).

use std::sync::atomic::Ordering;

use axum::{Json, extract::{Path, State}, http::StatusCode};
use serde::Serialize;

use sce::types::Address;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct UserStateResponse {
    pub address: String,
    pub registered: bool,
    pub reputation_x10: i64,
    pub likers_count: i64,
    pub mode: &'static str,
    pub badge: Option<&'static str>,
}

/// `GET /accounts/:address/state`
pub async fn get_user_state(
    State(app_state): State<SharedState>,
    Path(address): Path<String>,
) -> Result<Json<UserStateResponse>, (StatusCode, String)> {
    let height = app_state.tip_height.load(Ordering::SeqCst);
    let engine = app_state.engine.clone();

    let result = tokio::task::spawn_blocking(move || {
        let guard = engine.lock().expect("engine mutex poisoned");
        guard.get_user_state(&Address::from(address.as_str()), height)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("task panicked: {e}")))?;

    let user_state = result.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(UserStateResponse {
        address: user_state.address.to_string(),
        registered: user_state.registered,
        reputation_x10: user_state.reputation_x10,
        likers_count: user_state.likers_count,
        mode: match user_state.mode {
            sce::types::AccountMode::Trial => "trial",
            sce::types::AccountMode::Full => "full",
            sce::types::AccountMode::Pro => "pro",
        },
        badge: user_state.badge.map(|b| match b {
            sce::reputation::Badge::Shark => "shark",
            sce::reputation::Badge::Whale => "whale",
        }),
    }))
}
