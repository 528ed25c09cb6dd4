use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::chart::{ChartReport, RenderedArtifact};
use crate::models::transaction::RawTransaction;

/// Source of a token's current unit price.
///
/// Each oracle (CoinGecko, or a test double) implements this trait. If an API
/// stops working or changes, only that one implementation is replaced.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Human-readable name of this oracle (for logs/errors).
    fn name(&self) -> &str;

    /// Current price of one token (identified by contract address) in `currency`.
    async fn get_unit_price(&self, token: &str, currency: &str) -> Result<Decimal, CoreError>;
}

/// Source of a wallet's raw transaction history for one token contract.
///
/// Pagination and range selection are the implementation's business; callers
/// receive complete feeds.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    fn name(&self) -> &str;

    /// Token-transfer log entries touching `address`.
    async fn fetch_external_transfers(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError>;

    /// Contract-triggered (internal) transfers touching `address`.
    async fn fetch_internal_transfers(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError>;

    /// Current on-chain token balance in the smallest unit.
    async fn fetch_token_balance(&self, contract: &str, address: &str) -> Result<u128, CoreError>;
}

/// Turns a chart report into a deliverable artifact (image, JSON, ...).
pub trait SeriesRenderer: Send + Sync {
    fn render(&self, report: &ChartReport) -> Result<RenderedArtifact, CoreError>;
}

/// Sends a rendered artifact to whoever asked for it.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, artifact: RenderedArtifact, caption: &str) -> Result<(), CoreError>;
}
