pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{DateTime, Utc};
use models::{balance::BalanceSeries, chart::ChartReport, settings::WalletSettings};
use providers::{
    etherscan::EtherscanProvider,
    registry::OracleRegistry,
    traits::{DeliveryChannel, LedgerSource, SeriesRenderer},
};
use rust_decimal::Decimal;
use services::{
    chart_service::ChartService, ledger_service::LedgerReconstructor,
    price_service::PriceService,
};
use tracing::error;

use errors::CoreError;

/// Main entry point for the wallet-ledger core library.
/// Holds the wallet settings and every collaborator a chart request needs.
#[must_use]
pub struct WalletTracker {
    settings: WalletSettings,
    source: Box<dyn LedgerSource>,
    price_service: PriceService,
    reconstructor: LedgerReconstructor,
    chart_service: ChartService,
}

impl std::fmt::Debug for WalletTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletTracker")
            .field("watched_address", &self.settings.watched_address)
            .field("contract_address", &self.settings.contract_address)
            .field("source", &self.source.name())
            .field("oracles", &self.price_service.oracle_names())
            .field("reconstructor", &self.reconstructor)
            .finish()
    }
}

impl WalletTracker {
    /// Tracker wired to the default explorer and price oracle for `settings`.
    pub fn new(settings: WalletSettings) -> Result<Self, CoreError> {
        let source = Box::new(EtherscanProvider::from_settings(&settings));
        let registry = OracleRegistry::new_with_defaults(&settings);
        Self::with_collaborators(settings, source, registry)
    }

    /// Tracker with caller-supplied collaborators (tests, alternative explorers).
    pub fn with_collaborators(
        settings: WalletSettings,
        source: Box<dyn LedgerSource>,
        registry: OracleRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let reconstructor = LedgerReconstructor::from_settings(&settings)?;
        Ok(Self {
            settings,
            source,
            price_service: PriceService::new(registry),
            reconstructor,
            chart_service: ChartService::new(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    // ── Prices & Balance ────────────────────────────────────────────

    /// Current unit price of the tracked token in the quote currency.
    pub async fn unit_price(&self) -> Result<Decimal, CoreError> {
        self.price_service
            .get_unit_price(&self.settings.contract_address, &self.settings.quote_currency)
            .await
    }

    /// On-chain token balance of the watched wallet right now, in token units.
    pub async fn current_token_balance(&self) -> Result<Decimal, CoreError> {
        let raw = self
            .source
            .fetch_token_balance(&self.settings.contract_address, &self.settings.watched_address)
            .await?;
        self.reconstructor.unit().to_tokens(raw)
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Balance series for the trailing window ending at `now`.
    pub async fn balance_history(&self, now: DateTime<Utc>) -> Result<BalanceSeries, CoreError> {
        Ok(self.chart_report(now).await?.series)
    }

    /// Full chart report (series, title, caption) for the window ending at `now`.
    pub async fn chart_report(&self, now: DateTime<Utc>) -> Result<ChartReport, CoreError> {
        self.chart_service
            .build_report(
                self.source.as_ref(),
                &self.price_service,
                &self.reconstructor,
                &self.settings,
                now,
            )
            .await
    }

    /// Build, render and deliver the chart. Returns whether anything was sent.
    pub async fn publish_chart(
        &self,
        now: DateTime<Utc>,
        renderer: &dyn SeriesRenderer,
        channel: &dyn DeliveryChannel,
    ) -> Result<bool, CoreError> {
        let report = match self.chart_report(now).await {
            Ok(report) => report,
            Err(e) => {
                error!(wallet = %self.settings.watched_address, error = %e, "chart request aborted");
                return Err(e);
            }
        };
        self.chart_service.publish(&report, renderer, channel).await
    }
}
