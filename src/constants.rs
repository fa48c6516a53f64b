/// Application constants

pub const API_VERSION: &str = "v1";

// PayPal IPN verification
pub const PAYPAL_VERIFY_URL_LIVE: &str = "https://ipnpb.paypal.com/cgi-bin/webscr";
pub const PAYPAL_VERIFY_URL_SANDBOX: &str = "https://ipnpb.sandbox.paypal.com/cgi-bin/webscr";
pub const PAYPAL_VERIFY_CMD_FIELD: &str = "cmd";
pub const PAYPAL_VERIFY_CMD_VALUE: &str = "_notify-validate";
pub const PAYPAL_VERIFIED_REPLY: &str = "VERIFIED";
pub const PAYMENT_STATUS_COMPLETED: &str = "Completed";

// Continue purchase defaults
pub const DEFAULT_CONTINUE_PRICE: &str = "0.99";
pub const DEFAULT_CONTINUE_CURRENCY: &str = "USD";

// Sessions
pub const SESSION_TOKEN_BYTES: usize = 32;
pub const SESSION_TOKEN_HEX_LEN: usize = SESSION_TOKEN_BYTES * 2;
pub const SESSION_MINT_ATTEMPTS: usize = 3;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;
pub const REDIS_SESSION_KEY_PREFIX: &str = "arcade:session:";

// Scores
pub const DEFAULT_SCORE_LEVEL: i64 = 1;
pub const SCORE_SORT_PARAM: &str = "sort";
pub const SCORE_SORT_DESC: &str = "-score";

// Outbound HTTP
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 4;
pub const USER_AGENT: &str = concat!("arcade-relay/", env!("CARGO_PKG_VERSION"));
