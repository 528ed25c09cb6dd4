use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::traits::LedgerSource;
use crate::errors::CoreError;
use crate::models::settings::WalletSettings;
use crate::models::transaction::RawTransaction;

const BASE_URL: &str = "https://api.etherscan.io/api";

/// Explorers refuse `page * offset` beyond this.
const RESULT_WINDOW: u32 = 10_000;

/// Etherscan-compatible block explorer as a ledger source.
///
/// - **Endpoints**: `module=account` with `action=tokentx`, `txlistinternal`, `tokenbalance`
/// - **Key**: required by etherscan.io for anything beyond a trickle of calls.
///
/// Feeds are requested oldest-first and paged until a short page comes back
/// or the explorer's result window is exhausted.
pub struct EtherscanProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl EtherscanProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            page_size: RESULT_WINDOW,
        }
    }

    pub fn from_settings(settings: &WalletSettings) -> Self {
        Self::with_base_url(
            settings.explorer_api_url.as_str(),
            settings.api_key("etherscan").map(str::to_string),
        )
        .with_page_size(settings.page_size)
    }

    /// Page size (`offset`), clamped to the explorer's result window.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, RESULT_WINDOW);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Build an `account` module URL. Extra parameters are appended in order.
    pub fn make_api_url(
        &self,
        action: &str,
        contract: &str,
        address: &str,
        extra: &[(&str, String)],
    ) -> String {
        let mut url = format!(
            "{}?module=account&action={action}&contractaddress={contract}&address={address}",
            self.base_url
        );
        for (key, value) in extra {
            url.push_str(&format!("&{key}={value}"));
        }
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&apikey={key}"));
        }
        url
    }

    /// Decode one page of a transaction-list response.
    pub fn parse_transactions(body: &str) -> Result<Vec<RawTransaction>, CoreError> {
        let envelope: Envelope = serde_json::from_str(body)?;
        if envelope.status != "1" {
            if envelope.message.starts_with("No transactions found") {
                return Ok(Vec::new());
            }
            return Err(envelope.into_error());
        }
        Ok(serde_json::from_value(envelope.result)?)
    }

    /// Decode a `tokenbalance` response into smallest units.
    pub fn parse_balance(body: &str) -> Result<u128, CoreError> {
        let envelope: Envelope = serde_json::from_str(body)?;
        if envelope.status != "1" {
            return Err(envelope.into_error());
        }
        let text = envelope.result.as_str().ok_or_else(|| CoreError::Api {
            provider: "Etherscan".into(),
            message: format!("Unexpected balance payload: {}", envelope.result),
        })?;
        text.parse().map_err(|e| CoreError::Api {
            provider: "Etherscan".into(),
            message: format!("Invalid balance {text:?}: {e}"),
        })
    }

    async fn fetch_feed(
        &self,
        action: &str,
        contract: &str,
        address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let url = self.make_api_url(
                action,
                contract,
                address,
                &[
                    ("startblock", "0".to_string()),
                    ("endblock", "99999999".to_string()),
                    ("page", page.to_string()),
                    ("offset", self.page_size.to_string()),
                    ("sort", "asc".to_string()),
                ],
            );
            let body = self.client.get(&url).send().await?.text().await?;
            let batch = Self::parse_transactions(&body)?;
            debug!(action, page, count = batch.len(), "fetched explorer page");

            let full_page = batch.len() >= self.page_size as usize;
            records.extend(batch);

            if !full_page || (page + 1) * self.page_size > RESULT_WINDOW {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}

impl Default for EtherscanProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

// ── Etherscan API response types ────────────────────────────────────

#[derive(Deserialize)]
struct Envelope {
    status: String,
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl Envelope {
    fn into_error(self) -> CoreError {
        let detail = match self.result {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        CoreError::Api {
            provider: "Etherscan".into(),
            message: format!("{}: {detail}", self.message),
        }
    }
}

#[async_trait]
impl LedgerSource for EtherscanProvider {
    fn name(&self) -> &str {
        "Etherscan"
    }

    async fn fetch_external_transfers(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        self.fetch_feed("tokentx", contract, address).await
    }

    async fn fetch_internal_transfers(
        &self,
        contract: &str,
        address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        self.fetch_feed("txlistinternal", contract, address).await
    }

    async fn fetch_token_balance(&self, contract: &str, address: &str) -> Result<u128, CoreError> {
        let url = self.make_api_url(
            "tokenbalance",
            contract,
            address,
            &[("tag", "latest".to_string())],
        );
        let body = self.client.get(&url).send().await?.text().await?;
        Self::parse_balance(&body)
    }
}
