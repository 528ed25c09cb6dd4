use super::traits::SeriesRenderer;
use crate::errors::CoreError;
use crate::models::chart::{ChartReport, RenderedArtifact};

/// Renders a chart report as JSON for frontends that draw their own charts.
#[derive(Debug, Clone, Default)]
pub struct JsonSeriesRenderer {
    pretty: bool,
}

impl JsonSeriesRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SeriesRenderer for JsonSeriesRenderer {
    fn render(&self, report: &ChartReport) -> Result<RenderedArtifact, CoreError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(report)
        } else {
            serde_json::to_vec(report)
        }
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(RenderedArtifact {
            bytes,
            content_type: "application/json".to_string(),
        })
    }
}
