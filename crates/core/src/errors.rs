use thiserror::Error;

use crate::models::transaction::Feed;

/// Unified error type for the entire wallet-ledger-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Reconstruction ──────────────────────────────────────────────
    #[error("Pricing unavailable: {0}")]
    PricingUnavailable(String),

    #[error("Malformed {feed} record #{index}: {reason}")]
    MalformedRecord {
        feed: Feed,
        index: usize,
        reason: String,
    },

    #[error("Arithmetic overflow: {0}")]
    Arithmetic(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("No price oracle registered")]
    NoProvider,

    #[error("Price not available for {token} in {currency}")]
    PriceNotAvailable { token: String, currency: String },

    // ── Configuration ───────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Explorer URLs carry the API key in the query string; never surface it.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
