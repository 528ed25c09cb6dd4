use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::Feed;

/// One sample of the balance-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    /// When the originating transaction was mined
    pub time: DateTime<Utc>,

    /// Running token balance after the transaction (may go negative)
    pub token_balance: Decimal,

    /// `token_balance * unit_price` in the quote currency
    pub usd_value: Decimal,
}

/// A raw record that failed validation and was left out of the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub feed: Feed,
    pub index: usize,
    pub hash: Option<String>,
    pub reason: String,
}

/// Output of a ledger reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSeries {
    /// Time-ordered samples inside the window
    pub points: Vec<BalancePoint>,

    /// Records excluded as malformed
    pub rejected: Vec<RejectedRecord>,

    /// Records that touched neither side of the watched wallet
    pub ignored: usize,

    /// Balance after the last replayed record, in or out of the window
    pub closing_balance: Decimal,
}

impl BalanceSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn latest(&self) -> Option<&BalancePoint> {
        self.points.last()
    }

    /// Quote-currency value at the last sample, if any.
    pub fn latest_usd_value(&self) -> Option<Decimal> {
        self.latest().map(|p| p.usd_value)
    }
}
