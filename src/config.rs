use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CONTINUE_CURRENCY, DEFAULT_CONTINUE_PRICE, DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
    DEFAULT_SESSION_TTL_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS, PAYPAL_VERIFY_URL_LIVE,
    PAYPAL_VERIFY_URL_SANDBOX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(SessionBackend::Memory),
            "redis" => Ok(SessionBackend::Redis),
            other => anyhow::bail!("Unknown SESSION_BACKEND '{}'", other),
        }
    }
}

impl SessionBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionBackend::Memory => "memory",
            SessionBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub static_dir: String,

    // Record store
    pub record_store_url: String,
    pub record_store_api_key: String,

    // PayPal
    pub paypal_verify_url: String,
    pub paypal_receiver_email: Option<String>,
    pub continue_price: Decimal,
    pub continue_currency: String,

    // Outbound HTTP
    pub upstream_timeout_secs: u64,

    // Sessions
    pub session_backend: SessionBackend,
    pub redis_url: String,
    pub session_ttl_secs: u64,
    pub session_sweep_interval_secs: u64,
    pub session_consume_on_check: bool,

    // CORS
    pub cors_allowed_origins: String,
}

// Internal helper that parses truthy env values for `env_flag`.
fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| {
            let normalized = v.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
        })
        .unwrap_or(false)
}

fn verify_url_from_env(sandbox: bool) -> String {
    env::var("PAYPAL_VERIFY_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            if sandbox {
                PAYPAL_VERIFY_URL_SANDBOX.to_string()
            } else {
                PAYPAL_VERIFY_URL_LIVE.to_string()
            }
        })
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "dist".to_string()),

            record_store_url: env::var("RECORD_STORE_URL")?,
            record_store_api_key: env::var("RECORD_STORE_API_KEY")?,

            paypal_verify_url: verify_url_from_env(env_flag("PAYPAL_SANDBOX")),
            paypal_receiver_email: env::var("PAYPAL_RECEIVER_EMAIL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            continue_price: Decimal::from_str(
                env::var("CONTINUE_PRICE")
                    .unwrap_or_else(|_| DEFAULT_CONTINUE_PRICE.to_string())
                    .trim(),
            )?,
            continue_currency: env::var("CONTINUE_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CONTINUE_CURRENCY.to_string())
                .trim()
                .to_string(),

            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string())
                .parse()?,

            session_backend: env::var("SESSION_BACKEND")
                .unwrap_or_else(|_| "memory".to_string())
                .parse()?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
                .parse()?,
            session_sweep_interval_secs: env::var("SESSION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_SESSION_SWEEP_INTERVAL_SECS.to_string())
                .parse()?,
            session_consume_on_check: env_flag("SESSION_CONSUME_ON_CHECK"),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.record_store_url.trim().is_empty() {
            anyhow::bail!("RECORD_STORE_URL is empty");
        }
        url::Url::parse(self.record_store_url.trim())
            .map_err(|e| anyhow::anyhow!("RECORD_STORE_URL is invalid: {}", e))?;
        if self.record_store_api_key.trim().is_empty() {
            anyhow::bail!("RECORD_STORE_API_KEY is empty");
        }
        url::Url::parse(&self.paypal_verify_url)
            .map_err(|e| anyhow::anyhow!("PAYPAL_VERIFY_URL is invalid: {}", e))?;
        if self.continue_price <= Decimal::ZERO {
            anyhow::bail!("CONTINUE_PRICE must be positive");
        }
        if self.continue_currency.is_empty() {
            anyhow::bail!("CONTINUE_CURRENCY is empty");
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be > 0");
        }
        if i64::try_from(self.session_ttl_secs).is_err() {
            anyhow::bail!("SESSION_TTL_SECS is out of range");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be > 0");
        }

        if self.session_backend == SessionBackend::Memory && self.session_sweep_interval_secs == 0 {
            tracing::warn!("SESSION_SWEEP_INTERVAL_SECS is 0; expired sessions will not be swept");
        }
        if self.paypal_verify_url.contains("sandbox") && !self.is_development() {
            tracing::warn!("Using the PayPal sandbox verifier outside development");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }
        if !std::path::Path::new(&self.static_dir).is_dir() {
            tracing::warn!(
                "STATIC_DIR {} does not exist; fallback route will 404",
                self.static_dir
            );
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "sandbox"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "development".to_string(),
        static_dir: "dist".to_string(),
        record_store_url: "http://127.0.0.1:9/records".to_string(),
        record_store_api_key: "test-key".to_string(),
        paypal_verify_url: PAYPAL_VERIFY_URL_SANDBOX.to_string(),
        paypal_receiver_email: None,
        continue_price: Decimal::from_str(DEFAULT_CONTINUE_PRICE).unwrap(),
        continue_currency: DEFAULT_CONTINUE_CURRENCY.to_string(),
        upstream_timeout_secs: 2,
        session_backend: SessionBackend::Memory,
        redis_url: "redis://localhost:6379".to_string(),
        session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        session_sweep_interval_secs: DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
        session_consume_on_check: false,
        cors_allowed_origins: "*".to_string(),
    }
}
