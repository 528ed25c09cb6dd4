use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::unit::TokenUnit;
use crate::errors::CoreError;

/// Which explorer log a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feed {
    /// Token-transfer log (`tokentx`)
    External,
    /// Contract-triggered transfers (`txlistinternal`)
    Internal,
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feed::External => write!(f, "external"),
            Feed::Internal => write!(f, "internal"),
        }
    }
}

/// A transaction entry exactly as the block explorer reports it.
///
/// Explorers encode numbers as decimal strings; some mirrors use JSON
/// numbers. Both are accepted and kept as text until validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub from: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub to: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub value: Option<String>,

    #[serde(rename = "timeStamp", default, deserialize_with = "lenient_text")]
    pub time_stamp: Option<String>,

    #[serde(
        rename = "gasUsed",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_used: Option<String>,

    #[serde(
        rename = "gasPrice",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_price: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl RawTransaction {
    /// A token-transfer log entry (carries `gasPrice`).
    pub fn external(
        from: &str,
        to: &str,
        value: u128,
        timestamp: i64,
        gas_used: u128,
        gas_price: u128,
    ) -> Self {
        Self {
            hash: None,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(value.to_string()),
            time_stamp: Some(timestamp.to_string()),
            gas_used: Some(gas_used.to_string()),
            gas_price: Some(gas_price.to_string()),
        }
    }

    /// An internal-transaction log entry (no `gasPrice`).
    pub fn internal(from: &str, to: &str, value: u128, timestamp: i64, gas_used: u128) -> Self {
        Self {
            hash: None,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(value.to_string()),
            time_stamp: Some(timestamp.to_string()),
            gas_used: Some(gas_used.to_string()),
            gas_price: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// A validated ledger entry, ready for replay.
///
/// `amount` and `fee` are already divided down to token units.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub feed: Feed,
    /// Position within its feed, as delivered.
    pub index: usize,
    pub hash: Option<String>,
    pub from: String,
    pub to: String,
    pub value: u128,
    pub time: DateTime<Utc>,
    pub gas_used: Option<u128>,
    pub gas_price: Option<u128>,
    pub amount: Decimal,
    pub fee: Decimal,
}

impl TransactionRecord {
    /// Validate a raw explorer entry.
    ///
    /// Fee rule: with `gasPrice`, `fee = gasUsed * gasPrice`; without it the
    /// `gasUsed` figure is taken as already priced in the smallest unit.
    pub fn from_raw(
        raw: &RawTransaction,
        feed: Feed,
        index: usize,
        unit: TokenUnit,
    ) -> Result<Self, CoreError> {
        let malformed = |reason: String| CoreError::MalformedRecord {
            feed,
            index,
            reason,
        };

        let to = raw
            .to
            .clone()
            .ok_or_else(|| malformed("missing 'to' address".into()))?;
        let from = raw
            .from
            .clone()
            .ok_or_else(|| malformed("missing 'from' address".into()))?;

        let value = parse_unsigned(raw.value.as_deref(), "value").map_err(&malformed)?;

        let seconds: i64 = raw
            .time_stamp
            .as_deref()
            .ok_or_else(|| malformed("missing 'timeStamp'".into()))?
            .trim()
            .parse()
            .map_err(|e| malformed(format!("invalid 'timeStamp': {e}")))?;
        let time = DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or_else(|| malformed(format!("timestamp {seconds} out of range")))?;

        let gas_used = raw
            .gas_used
            .as_deref()
            .map(|g| parse_unsigned(Some(g), "gasUsed"))
            .transpose()
            .map_err(&malformed)?;
        let gas_price = raw
            .gas_price
            .as_deref()
            .map(|g| parse_unsigned(Some(g), "gasPrice"))
            .transpose()
            .map_err(&malformed)?;

        let raw_fee = match (gas_used, gas_price) {
            (Some(used), Some(price)) => used
                .checked_mul(price)
                .ok_or_else(|| malformed(format!("fee {used} * {price} overflows")))?,
            (None, Some(_)) => return Err(malformed("'gasPrice' without 'gasUsed'".into())),
            (Some(used), None) => used,
            (None, None) => 0,
        };

        let amount = unit
            .to_tokens(value)
            .map_err(|e| malformed(e.to_string()))?;
        let fee = unit
            .to_tokens(raw_fee)
            .map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            feed,
            index,
            hash: raw.hash.clone(),
            from,
            to,
            value,
            time,
            gas_used,
            gas_price,
            amount,
            fee,
        })
    }
}

fn parse_unsigned(text: Option<&str>, field: &str) -> Result<u128, String> {
    let text = text.ok_or_else(|| format!("missing '{field}'"))?;
    text.trim()
        .parse::<u128>()
        .map_err(|e| format!("invalid '{field}' {text:?}: {e}"))
}
