use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::BalanceSeries;

/// Everything a renderer needs for one wallet chart.
///
/// The core computes all the numbers; the renderer only draws them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartReport {
    /// The reconstructed balance series
    pub series: BalanceSeries,

    /// Unit price used for every `usd_value` in the series
    pub unit_price: Decimal,

    /// Quote currency of `unit_price`
    pub quote_currency: String,

    /// Earliest instant a point may carry
    pub window_start: DateTime<Utc>,

    /// When the report was built
    pub generated_at: DateTime<Utc>,

    /// Headline for the chart, e.g. "Community Wallet Balance | Total Price: $1,234.56"
    pub title: String,

    /// Message sent alongside the artifact (the explorer address link)
    pub caption: String,
}

/// Opaque output of a `SeriesRenderer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
