use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::{json_body, AppState};
use crate::{error::Result, models::SubmitScoreRequest};

/// GET /api/scores
pub async fn list_scores(State(state): State<AppState>) -> Result<Json<Value>> {
    let records = state.scores.list_scores().await?;
    Ok(Json(records))
}

/// POST /api/scores
pub async fn submit_score(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let req = json_body(payload)?;
    let created = state.scores.submit_score(&req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
