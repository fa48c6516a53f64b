use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::constants::{PAYPAL_VERIFY_CMD_FIELD, PAYPAL_VERIFY_CMD_VALUE};

// ==================== SESSION ====================
/// Pending continue-purchase state for one offer shown to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub level: u32,
    pub purchased: bool,
    pub created_at: i64,
}

impl Session {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            purchased: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self, now: i64, ttl_secs: u64) -> bool {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        now.saturating_sub(self.created_at) >= ttl
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub level: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionToken")]
    pub session_token: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ContinueStatus {
    #[serde(rename = "hasPurchasedContinue")]
    pub has_purchased_continue: bool,
    pub level: u32,
}

impl From<&Session> for ContinueStatus {
    fn from(session: &Session) -> Self {
        Self {
            has_purchased_continue: session.purchased,
            level: session.level,
        }
    }
}

// ==================== SCORES ====================
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub player_name: Option<Value>,
    #[serde(default)]
    pub level: Option<Value>,
}

/// Body forwarded to the record store when a score is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewScoreRecord {
    pub score: i64,
    pub player_name: String,
    pub level: i64,
}

// ==================== PAYMENT NOTIFICATION ====================
/// An IPN form body. The raw bytes are kept for the verification echo;
/// decoded fields are only used for reading values.
#[derive(Debug, Clone, Default)]
pub struct IpnNotification {
    raw: Vec<u8>,
    fields: Vec<(String, String)>,
}

impl IpnNotification {
    pub fn from_form(raw: &[u8]) -> Self {
        let fields = form_urlencoded::parse(raw)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            raw: raw.to_vec(),
            fields,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The received payload, byte for byte, with the validation command appended.
    /// PayPal compares the echo against what it sent, so nothing is re-encoded.
    pub fn verification_body(&self) -> Vec<u8> {
        let cmd = form_urlencoded::Serializer::new(String::new())
            .append_pair(PAYPAL_VERIFY_CMD_FIELD, PAYPAL_VERIFY_CMD_VALUE)
            .finish();

        let mut body = Vec::with_capacity(self.raw.len() + cmd.len() + 1);
        body.extend_from_slice(&self.raw);
        if !body.is_empty() && !body.ends_with(b"&") {
            body.push(b'&');
        }
        body.extend_from_slice(cmd.as_bytes());
        body
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.get("payment_status")
    }

    pub fn gross(&self) -> Option<&str> {
        self.get("mc_gross")
    }

    pub fn currency(&self) -> Option<&str> {
        self.get("mc_currency")
    }

    pub fn session_token(&self) -> Option<&str> {
        self.get("custom").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn txn_id(&self) -> Option<&str> {
        self.get("txn_id")
    }

    pub fn receiver_email(&self) -> Option<&str> {
        self.get("receiver_email")
    }
}
