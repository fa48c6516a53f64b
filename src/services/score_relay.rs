use serde_json::Value;
use std::sync::Arc;

use crate::{
    constants::DEFAULT_SCORE_LEVEL,
    error::{AppError, Result},
    integrations::ScoreStore,
    models::{NewScoreRecord, SubmitScoreRequest},
    utils::{coerce_integer, require_integer},
};

/// Builds the record to forward, applying the default level.
pub fn build_score_record(req: &SubmitScoreRequest) -> Result<NewScoreRecord> {
    let score = require_integer(req.score.as_ref(), "score")?;

    let player_name = match &req.player_name {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err(AppError::BadRequest("player_name is required".to_string()))
        }
        Some(_) => {
            return Err(AppError::BadRequest(
                "player_name must be a string".to_string(),
            ))
        }
    };

    let level = match &req.level {
        None | Some(Value::Null) => DEFAULT_SCORE_LEVEL,
        Some(v) => coerce_integer(v)
            .ok_or_else(|| AppError::BadRequest("level must be an integer".to_string()))?,
    };

    Ok(NewScoreRecord {
        score,
        player_name,
        level,
    })
}

/// Pass-through to the external high-score table.
#[derive(Clone)]
pub struct ScoreRelay {
    store: Arc<dyn ScoreStore>,
}

impl ScoreRelay {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    pub async fn list_scores(&self) -> Result<Value> {
        self.store.list_scores().await
    }

    pub async fn submit_score(&self, req: &SubmitScoreRequest) -> Result<Value> {
        let record = build_score_record(req)?;
        let created = self.store.create_score(&record).await?;
        tracing::info!(
            "Score submitted player={} score={} level={}",
            record.player_name,
            record.score,
            record.level
        );
        Ok(created)
    }
}
