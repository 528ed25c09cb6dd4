use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::balance::{BalancePoint, BalanceSeries, RejectedRecord};
use crate::models::settings::{DirectionPolicy, WalletSettings, WindowMode};
use crate::models::transaction::{Feed, RawTransaction, TransactionRecord};
use crate::models::unit::TokenUnit;

/// How a single record moves the watched wallet's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
    Irrelevant,
}

impl DirectionPolicy {
    /// Classify `record` relative to `watched` (case-insensitive).
    pub fn classify(self, record: &TransactionRecord, watched: &str) -> Direction {
        if record.to.eq_ignore_ascii_case(watched) {
            return Direction::Inbound;
        }
        match self {
            DirectionPolicy::DestinationOnly => Direction::Outbound,
            DirectionPolicy::Strict if record.from.eq_ignore_ascii_case(watched) => {
                Direction::Outbound
            }
            DirectionPolicy::Strict => Direction::Irrelevant,
        }
    }
}

/// Merge both feeds into one validated sequence: external first, then internal.
///
/// Entries that fail validation are logged and returned separately instead
/// of aborting the merge.
pub fn merge_feeds(
    external: &[RawTransaction],
    internal: &[RawTransaction],
    unit: TokenUnit,
) -> (Vec<TransactionRecord>, Vec<RejectedRecord>) {
    let mut records = Vec::with_capacity(external.len() + internal.len());
    let mut rejected = Vec::new();

    let tagged = external
        .iter()
        .enumerate()
        .map(|(i, raw)| (Feed::External, i, raw))
        .chain(
            internal
                .iter()
                .enumerate()
                .map(|(i, raw)| (Feed::Internal, i, raw)),
        );

    for (feed, index, raw) in tagged {
        match TransactionRecord::from_raw(raw, feed, index, unit) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(%feed, index, hash = ?raw.hash, error = %e, "skipping malformed transaction record");
                rejected.push(RejectedRecord {
                    feed,
                    index,
                    hash: raw.hash.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (records, rejected)
}

/// Replays a wallet's transaction history into a windowed balance series.
///
/// Pure: no I/O, no shared state. Safe to call from any number of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerReconstructor {
    unit: TokenUnit,
    window_mode: WindowMode,
    direction_policy: DirectionPolicy,
}

impl LedgerReconstructor {
    pub fn new(unit: TokenUnit) -> Self {
        Self {
            unit,
            window_mode: WindowMode::default(),
            direction_policy: DirectionPolicy::default(),
        }
    }

    pub fn from_settings(settings: &WalletSettings) -> Result<Self, CoreError> {
        Ok(Self::new(settings.token_unit()?)
            .with_window_mode(settings.window_mode)
            .with_direction_policy(settings.direction_policy))
    }

    pub fn with_window_mode(mut self, window_mode: WindowMode) -> Self {
        self.window_mode = window_mode;
        self
    }

    pub fn with_direction_policy(mut self, direction_policy: DirectionPolicy) -> Self {
        self.direction_policy = direction_policy;
        self
    }

    pub fn unit(&self) -> TokenUnit {
        self.unit
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    pub fn direction_policy(&self) -> DirectionPolicy {
        self.direction_policy
    }

    /// Build the balance series for `watched_address`.
    ///
    /// 1. Merge both feeds (malformed entries are set aside)
    /// 2. Stable-sort by timestamp; same-second records keep merge order
    /// 3. Replay into a running balance, charging fees on outbound records
    /// 4. Emit a point for every replayed record at or after `window_start`
    ///
    /// Fails with `PricingUnavailable` before touching the feeds if
    /// `unit_price` is not positive.
    pub fn reconstruct(
        &self,
        external: &[RawTransaction],
        internal: &[RawTransaction],
        watched_address: &str,
        unit_price: Decimal,
        window_start: DateTime<Utc>,
    ) -> Result<BalanceSeries, CoreError> {
        if unit_price <= Decimal::ZERO {
            return Err(CoreError::PricingUnavailable(format!(
                "unit price {unit_price} is not positive"
            )));
        }

        let (mut records, rejected) = merge_feeds(external, internal, self.unit);
        records.sort_by_key(|r| r.time);

        let mut balance = Decimal::ZERO;
        let mut points = Vec::with_capacity(records.len());
        let mut ignored = 0;

        for record in &records {
            let in_window = record.time >= window_start;
            if !in_window && self.window_mode == WindowMode::ResetAtWindowStart {
                continue;
            }

            let delta = match self.direction_policy.classify(record, watched_address) {
                Direction::Inbound => record.amount,
                Direction::Outbound => -record
                    .amount
                    .checked_add(record.fee)
                    .ok_or_else(|| overflow(record))?,
                Direction::Irrelevant => {
                    debug!(feed = %record.feed, index = record.index, "record does not touch watched wallet");
                    ignored += 1;
                    continue;
                }
            };
            balance = balance.checked_add(delta).ok_or_else(|| overflow(record))?;

            if !in_window {
                continue;
            }
            let usd_value = balance
                .checked_mul(unit_price)
                .ok_or_else(|| overflow(record))?;
            points.push(BalancePoint {
                time: record.time,
                token_balance: balance,
                usd_value,
            });
        }

        debug!(
            merged = records.len(),
            points = points.len(),
            rejected = rejected.len(),
            ignored,
            "ledger reconstructed"
        );

        Ok(BalanceSeries {
            points,
            rejected,
            ignored,
            closing_balance: balance,
        })
    }
}

fn overflow(record: &TransactionRecord) -> CoreError {
    CoreError::Arithmetic(format!(
        "running balance overflowed at {} record #{}",
        record.feed, record.index
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xWallet";

    fn record(to: &str, from: &str) -> TransactionRecord {
        let raw = RawTransaction::internal(from, to, 1, 0, 0);
        TransactionRecord::from_raw(&raw, Feed::Internal, 0, TokenUnit::default()).unwrap()
    }

    #[test]
    fn destination_only_treats_third_party_as_outbound() {
        let r = record("0xOther", "0xSomeoneElse");
        assert_eq!(
            DirectionPolicy::DestinationOnly.classify(&r, WALLET),
            Direction::Outbound
        );
    }

    #[test]
    fn strict_ignores_third_party() {
        let r = record("0xOther", "0xSomeoneElse");
        assert_eq!(DirectionPolicy::Strict.classify(&r, WALLET), Direction::Irrelevant);
    }

    #[test]
    fn strict_matches_sender_case_insensitively() {
        let r = record("0xOther", "0XWALLET");
        assert_eq!(DirectionPolicy::Strict.classify(&r, WALLET), Direction::Outbound);
    }

    #[test]
    fn inbound_wins_for_self_transfer() {
        let r = record("0xwallet", "0xwallet");
        assert_eq!(DirectionPolicy::Strict.classify(&r, WALLET), Direction::Inbound);
        assert_eq!(
            DirectionPolicy::DestinationOnly.classify(&r, WALLET),
            Direction::Inbound
        );
    }
}
