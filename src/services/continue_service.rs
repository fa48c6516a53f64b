use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::{
    config::Config,
    constants::{PAYMENT_STATUS_COMPLETED, SESSION_MINT_ATTEMPTS, SESSION_TOKEN_HEX_LEN},
    db::{generate_session_token, SessionStore},
    error::{AppError, Result},
    integrations::{PaymentVerifier, VerificationVerdict},
    models::{ContinueStatus, IpnNotification, Session},
};

/// What the continue offer costs and who must be paid.
#[derive(Debug, Clone)]
pub struct PurchasePolicy {
    pub price: Decimal,
    pub currency: String,
    pub receiver_email: Option<String>,
}

impl PurchasePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            price: config.continue_price,
            currency: config.continue_currency.clone(),
            receiver_email: config.paypal_receiver_email.clone(),
        }
    }
}

/// Result of a verified notification. Every variant is answered with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpnOutcome {
    Granted,
    AlreadyGranted,
    NotCompleted(String),
    ReceiverMismatch(String),
    AmountMismatch { gross: String, currency: String },
}

// Returns the first failed acceptance check, or `None` when the payment qualifies.
fn check_payment_terms(ipn: &IpnNotification, policy: &PurchasePolicy) -> Option<IpnOutcome> {
    let status = ipn.payment_status().unwrap_or_default();
    if status != PAYMENT_STATUS_COMPLETED {
        return Some(IpnOutcome::NotCompleted(status.to_string()));
    }

    if let Some(expected) = &policy.receiver_email {
        let receiver = ipn.receiver_email().unwrap_or_default();
        if !receiver.trim().eq_ignore_ascii_case(expected) {
            return Some(IpnOutcome::ReceiverMismatch(receiver.to_string()));
        }
    }

    let currency = ipn.currency().unwrap_or_default();
    let gross = ipn.gross().unwrap_or_default();
    let amount_matches = Decimal::from_str(gross.trim())
        .map(|amount| amount == policy.price)
        .unwrap_or(false);
    if currency != policy.currency || !amount_matches {
        return Some(IpnOutcome::AmountMismatch {
            gross: gross.to_string(),
            currency: currency.to_string(),
        });
    }

    None
}

/// Session lifecycle for the in-game "continue" purchase.
#[derive(Clone)]
pub struct ContinueService {
    sessions: Arc<dyn SessionStore>,
    verifier: Arc<dyn PaymentVerifier>,
    policy: PurchasePolicy,
    consume_on_check: bool,
}

impl ContinueService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn PaymentVerifier>,
        policy: PurchasePolicy,
        consume_on_check: bool,
    ) -> Self {
        Self {
            sessions,
            verifier,
            policy,
            consume_on_check,
        }
    }

    /// Opens a purchase session for `level` and returns its token.
    pub async fn create_session(&self, level: u32) -> Result<String> {
        for _ in 0..SESSION_MINT_ATTEMPTS {
            let token = generate_session_token();
            if self.sessions.create(&token, Session::new(level)).await? {
                tracing::debug!("Created continue session level={}", level);
                return Ok(token);
            }
            tracing::warn!("Session token collision, minting again");
        }
        Err(AppError::Internal(
            "Could not mint a unique session token".to_string(),
        ))
    }

    pub async fn check_continue(&self, token: &str) -> Result<ContinueStatus> {
        if token.len() != SESSION_TOKEN_HEX_LEN {
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        let session = self
            .sessions
            .get(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if self.consume_on_check && session.purchased {
            self.sessions.remove(token).await?;
            tracing::info!("Consumed purchased continue session level={}", session.level);
        }

        Ok(ContinueStatus::from(&session))
    }

    /// Verifies an IPN payload with the provider, then grants the continue
    /// if the payment qualifies.
    pub async fn handle_payment_notification(&self, raw_form: &[u8]) -> Result<IpnOutcome> {
        let ipn = IpnNotification::from_form(raw_form);
        if ipn.is_empty() {
            return Err(AppError::VerificationFailed(
                "Empty payment notification".to_string(),
            ));
        }

        match self.verifier.verify(&ipn).await? {
            VerificationVerdict::Verified => {}
            VerificationVerdict::Rejected(reply) => {
                tracing::warn!(
                    "IPN rejected by verifier txn_id={} reply={}",
                    ipn.txn_id().unwrap_or("-"),
                    reply
                );
                return Err(AppError::VerificationFailed(
                    "Notification not verified".to_string(),
                ));
            }
        }

        let txn_id = ipn.txn_id().unwrap_or("-");
        tracing::info!("IPN verified txn_id={}", txn_id);

        if let Some(outcome) = check_payment_terms(&ipn, &self.policy) {
            tracing::warn!("IPN ignored txn_id={} outcome={:?}", txn_id, outcome);
            return Ok(outcome);
        }

        let token = ipn.session_token().ok_or_else(|| {
            tracing::warn!("IPN without session token txn_id={}", txn_id);
            AppError::VerificationFailed("Unknown session".to_string())
        })?;

        let session = self.sessions.get(token).await?.ok_or_else(|| {
            tracing::warn!("IPN for unknown session txn_id={}", txn_id);
            AppError::VerificationFailed("Unknown session".to_string())
        })?;

        if session.purchased {
            tracing::info!("IPN for already granted session txn_id={}", txn_id);
            return Ok(IpnOutcome::AlreadyGranted);
        }

        let granted = Session {
            purchased: true,
            ..session
        };
        if !self.sessions.set(token, granted).await? {
            tracing::warn!("Session expired before grant txn_id={}", txn_id);
            return Err(AppError::VerificationFailed("Unknown session".to_string()));
        }

        tracing::info!("Continue granted txn_id={}", txn_id);
        Ok(IpnOutcome::Granted)
    }
}
