pub mod paypal;
pub mod record_store;

use reqwest::Client;
use std::time::Duration;

use crate::{
    config::Config,
    constants::{UPSTREAM_CONNECT_TIMEOUT_SECS, USER_AGENT},
};

pub use paypal::{PaymentVerifier, PaypalIpnClient, VerificationVerdict};
pub use record_store::{RecordStoreClient, ScoreStore};

/// Shared outbound client. Every upstream call is bounded by the configured timeout.
pub fn build_http_client(config: &Config) -> anyhow::Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .build()?;
    Ok(client)
}
