use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{json_body, AppState};
use crate::{
    error::Result,
    models::{ContinueStatus, CreateSessionRequest, CreateSessionResponse},
    utils::require_level,
};

/// POST /api/create-session
pub async fn create_session(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<CreateSessionResponse>> {
    let req = json_body(payload)?;
    let level = require_level(req.level.as_ref())?;

    let session_token = state.continues.create_session(level).await?;

    Ok(Json(CreateSessionResponse { session_token }))
}

/// GET /api/check-continue/{token}
pub async fn check_continue(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ContinueStatus>> {
    let status = state.continues.check_continue(&token).await?;
    Ok(Json(status))
}
