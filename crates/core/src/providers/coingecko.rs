use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use super::traits::PriceOracle;
use crate::errors::CoreError;
use crate::models::settings::WalletSettings;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko price oracle for ERC-20 tokens.
///
/// - **Free**: public endpoint works without a key; a demo key raises limits.
/// - **Endpoint**: `/simple/token_price/{platform}?contract_addresses=..&vs_currencies=..`
///
/// Note: CoinGecko keys the response by the lowercased contract address and
/// the lowercased currency code.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    platform: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(platform: impl Into<String>) -> Self {
        Self::with_base_url(BASE_URL, platform, None)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        platform: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            platform: platform.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &WalletSettings) -> Self {
        Self::with_base_url(
            settings.price_api_url.as_str(),
            settings.platform.as_str(),
            settings.api_key("coingecko").map(str::to_string),
        )
    }

    /// Build the simple-price URL for one token.
    pub fn price_url(&self, token: &str, currency: &str) -> String {
        let mut url = format!(
            "{}/simple/token_price/{}?contract_addresses={}&vs_currencies={}",
            self.base_url,
            self.platform,
            token,
            currency.to_lowercase()
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&x_cg_demo_api_key={key}"));
        }
        url
    }

    /// Extract the price for `token` in `currency` from a simple-price body.
    pub fn parse_price_response(
        body: &str,
        token: &str,
        currency: &str,
    ) -> Result<Decimal, CoreError> {
        let resp: HashMap<String, HashMap<String, serde_json::Number>> =
            serde_json::from_str(body).map_err(|e| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("Failed to parse price response for {token}: {e}"),
            })?;

        let price = resp
            .get(&token.to_lowercase())
            .and_then(|quotes| quotes.get(&currency.to_lowercase()))
            .map(|n| n.to_string())
            .ok_or_else(|| CoreError::PriceNotAvailable {
                token: token.to_string(),
                currency: currency.to_string(),
            })?;

        // Tiny prices arrive in exponent form ("1.234e-5").
        Decimal::from_str(&price)
            .or_else(|_| Decimal::from_scientific(&price))
            .map_err(|e| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("Invalid price format for {token}: {price} ({e})"),
            })
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new("ethereum")
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn get_unit_price(&self, token: &str, currency: &str) -> Result<Decimal, CoreError> {
        let url = self.price_url(token, currency);
        let body = self.client.get(&url).send().await?.text().await?;
        Self::parse_price_response(&body, token, currency)
    }
}
