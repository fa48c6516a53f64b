use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_store: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_status = match state.sessions.ping().await {
        Ok(()) => format!("{}: connected", state.sessions.backend_name()),
        Err(e) => {
            tracing::warn!("Session store health check failed: {}", e);
            format!("{}: disconnected", state.sessions.backend_name())
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_store: store_status,
    })
}
