use axum::{body::Bytes, extract::State, http::StatusCode};

use super::AppState;

/// POST /api/paypal-ipn
///
/// Called by PayPal, not the game. Policy rejections still answer 200 so the
/// notifier stops redelivering; only unverifiable or unknown-session payloads
/// get 400, and verifier outages get 500.
pub async fn paypal_ipn(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match state.continues.handle_payment_notification(&body).await {
        Ok(outcome) => {
            tracing::debug!("IPN handled: {:?}", outcome);
            StatusCode::OK
        }
        Err(err) => {
            tracing::warn!("IPN failed: {}", err);
            err.status()
        }
    }
}
