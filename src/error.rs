use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::VerificationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::Redis(_) | AppError::ExternalAPI(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 5xx detail stays in the logs.
        let (code, message) = match self {
            AppError::NotFound(ref msg) => ("NOT_FOUND", msg.clone()),
            AppError::BadRequest(ref msg) => ("BAD_REQUEST", msg.clone()),
            AppError::VerificationFailed(ref msg) => ("VERIFICATION_FAILED", msg.clone()),
            AppError::Redis(ref e) => {
                tracing::error!("Session store failure: {}", e);
                ("SESSION_STORE_ERROR", "Session storage unavailable".to_string())
            }
            AppError::ExternalAPI(ref msg) => {
                tracing::error!("Upstream failure: {}", msg);
                ("UPSTREAM_ERROR", "Upstream service unavailable".to_string())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal failure: {}", msg);
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
