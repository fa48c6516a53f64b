// src/api/mod.rs

pub mod health;
pub mod paypal_ipn;
pub mod scores;
pub mod session;

use axum::{extract::rejection::JsonRejection, Json};
use std::sync::Arc;

use crate::{
    config::Config,
    db::SessionStore,
    error::{AppError, Result},
    services::{ContinueService, ScoreRelay},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub continues: ContinueService,
    pub scores: ScoreRelay,
}

/// Unwraps a JSON body, turning extractor rejections into our 400 shape.
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
