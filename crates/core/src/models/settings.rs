use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::unit::{TokenUnit, DEFAULT_DECIMALS};
use crate::errors::CoreError;

/// Maximum trailing window in days (10 years).
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// How records are attributed to the watched wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionPolicy {
    /// Addressed to the wallet is inbound; everything else is outbound.
    #[default]
    DestinationOnly,
    /// Inbound if addressed to the wallet, outbound if sent from it,
    /// otherwise ignored.
    Strict,
}

/// How the trailing window interacts with the running balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowMode {
    /// Accumulate from the first record ever; only display-clip at the window.
    #[default]
    Continuous,
    /// Drop pre-window records before accumulating; the balance starts at zero
    /// on the window edge.
    ResetAtWindowStart,
}

/// Everything one wallet chart request needs, passed explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// The wallet whose balance is charted.
    pub watched_address: String,

    /// ERC-20 contract of the tracked token.
    pub contract_address: String,

    /// Price-oracle platform id for the contract (e.g., "ethereum").
    pub platform: String,

    /// Quote currency for values (e.g., "usd").
    pub quote_currency: String,

    pub token_decimals: u32,

    /// Trailing window length.
    pub window_days: i64,

    /// Explorer API endpoint (Etherscan-compatible).
    pub explorer_api_url: String,

    /// Explorer web root, used for the caption link.
    pub explorer_url: String,

    /// Price oracle API root (CoinGecko-compatible).
    pub price_api_url: String,

    /// Explorer page size (`offset`).
    pub page_size: u32,

    pub direction_policy: DirectionPolicy,

    pub window_mode: WindowMode,

    /// Keys: provider name ("etherscan", "coingecko"). Values: the API key.
    pub api_keys: HashMap<String, String>,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            watched_address: "0xD22849fcB4C83389E65a1c40748a9b67157638A3".to_string(),
            contract_address: "0xaa95f26e30001251fb905d264Aa7b00eE9dF6C18".to_string(),
            platform: "ethereum".to_string(),
            quote_currency: "usd".to_string(),
            token_decimals: DEFAULT_DECIMALS,
            window_days: 90,
            explorer_api_url: "https://api.etherscan.io/api".to_string(),
            explorer_url: "https://etherscan.io".to_string(),
            price_api_url: "https://api.coingecko.com/api/v3".to_string(),
            page_size: 10_000,
            direction_policy: DirectionPolicy::default(),
            window_mode: WindowMode::default(),
            api_keys: HashMap::new(),
        }
    }
}

impl WalletSettings {
    /// Parse settings from JSON. Missing fields fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.watched_address.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Watched address must not be empty".into(),
            ));
        }
        if self.contract_address.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Contract address must not be empty".into(),
            ));
        }
        if self.window_days <= 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(CoreError::ValidationError(format!(
                "Window of {} days must be between 1 and {MAX_WINDOW_DAYS} days",
                self.window_days
            )));
        }
        if self.page_size == 0 {
            return Err(CoreError::ValidationError(
                "Explorer page size must be positive".into(),
            ));
        }
        TokenUnit::new(self.token_decimals)?;
        Ok(())
    }

    pub fn token_unit(&self) -> Result<TokenUnit, CoreError> {
        TokenUnit::new(self.token_decimals)
    }

    /// Start of the trailing window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.window_days)
    }

    /// Explorer page of the watched wallet.
    pub fn address_link(&self) -> String {
        format!(
            "{}/address/{}",
            self.explorer_url.trim_end_matches('/'),
            self.watched_address.to_lowercase()
        )
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }
}
