use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::{
    constants::PAYPAL_VERIFIED_REPLY,
    error::{AppError, Result},
    models::IpnNotification,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationVerdict {
    Verified,
    /// The verifier answered, but not with `VERIFIED`. Holds the reply text.
    Rejected(String),
}

/// Round-trips an IPN payload back to the payment provider.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, notification: &IpnNotification) -> Result<VerificationVerdict>;
}

#[derive(Clone, Debug)]
pub struct PaypalIpnClient {
    verify_url: String,
    client: Client,
}

impl PaypalIpnClient {
    pub fn new(verify_url: String, client: Client) -> Self {
        Self { verify_url, client }
    }
}

pub(crate) fn interpret_reply(body: &str) -> VerificationVerdict {
    if body == PAYPAL_VERIFIED_REPLY {
        VerificationVerdict::Verified
    } else {
        VerificationVerdict::Rejected(body.chars().take(64).collect())
    }
}

#[async_trait]
impl PaymentVerifier for PaypalIpnClient {
    async fn verify(&self, notification: &IpnNotification) -> Result<VerificationVerdict> {
        let response = self
            .client
            .post(&self.verify_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(notification.verification_body())
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IPN verification request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AppError::ExternalAPI(format!(
                "IPN verifier returned status {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IPN verifier reply unreadable: {}", e)))?;

        Ok(interpret_reply(&body))
    }
}
