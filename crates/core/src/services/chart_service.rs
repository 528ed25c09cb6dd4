use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::chart::ChartReport;
use crate::models::settings::WalletSettings;
use crate::providers::traits::{DeliveryChannel, LedgerSource, SeriesRenderer};
use crate::services::ledger_service::LedgerReconstructor;
use crate::services::price_service::PriceService;

const TITLE: &str = "Community Wallet Balance";

/// Runs one chart request end to end.
///
/// - Fetches both ledger feeds and the unit price concurrently
/// - Reconstructs the windowed balance series
/// - Hands the result to a renderer and a delivery channel
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Fetch, reconstruct and summarise the trailing window ending at `now`.
    pub async fn build_report(
        &self,
        source: &dyn LedgerSource,
        prices: &PriceService,
        reconstructor: &LedgerReconstructor,
        settings: &WalletSettings,
        now: DateTime<Utc>,
    ) -> Result<ChartReport, CoreError> {
        let window_start = settings.window_start(now);
        let contract = settings.contract_address.as_str();
        let wallet = settings.watched_address.as_str();

        let (external, internal, unit_price) = tokio::try_join!(
            source.fetch_external_transfers(contract, wallet),
            source.fetch_internal_transfers(contract, wallet),
            prices.get_unit_price(contract, &settings.quote_currency),
        )?;
        info!(
            source = source.name(),
            external = external.len(),
            internal = internal.len(),
            %unit_price,
            "fetched ledger feeds"
        );

        let series =
            reconstructor.reconstruct(&external, &internal, wallet, unit_price, window_start)?;
        let total = series.latest_usd_value().unwrap_or_default();

        Ok(ChartReport {
            title: format!("{TITLE} | Total Price: ${}", format_amount(total, 2)),
            caption: settings.address_link(),
            series,
            unit_price,
            quote_currency: settings.quote_currency.clone(),
            window_start,
            generated_at: now,
        })
    }

    /// Render `report` and hand it to `channel`.
    ///
    /// Returns `false` without rendering when the series is empty. Delivery
    /// failures are logged, not returned.
    pub async fn publish(
        &self,
        report: &ChartReport,
        renderer: &dyn SeriesRenderer,
        channel: &dyn DeliveryChannel,
    ) -> Result<bool, CoreError> {
        if report.series.is_empty() {
            info!("no balance points inside the window; nothing to publish");
            return Ok(false);
        }

        let artifact = renderer.render(report)?;
        info!(
            bytes = artifact.bytes.len(),
            content_type = %artifact.content_type,
            "rendered balance chart"
        );

        if let Err(e) = channel.deliver(artifact, &report.caption).await {
            warn!(error = %e, "chart delivery failed");
        }
        Ok(true)
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a decimal with a fixed number of places and thousands separators.
pub fn format_amount(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", places as usize, rounded);

    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let grouped = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
