use crate::models::settings::WalletSettings;

use super::coingecko::CoinGeckoProvider;
use super::traits::PriceOracle;

/// Registry of all available price oracles.
///
/// Registration order is fallback order: the price service asks the first
/// oracle, then the next one if it fails.
pub struct OracleRegistry {
    oracles: Vec<Box<dyn PriceOracle>>,
}

impl OracleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            oracles: Vec::new(),
        }
    }

    /// Create a registry with the default oracles for these settings.
    pub fn new_with_defaults(settings: &WalletSettings) -> Self {
        let mut registry = Self::new();

        // CoinGecko: public endpoint, optional demo key
        registry.register(Box::new(CoinGeckoProvider::from_settings(settings)));

        registry
    }

    /// Register a new price oracle.
    pub fn register(&mut self, oracle: Box<dyn PriceOracle>) {
        self.oracles.push(oracle);
    }

    /// All oracles, ordered by registration priority.
    pub fn oracles(&self) -> Vec<&dyn PriceOracle> {
        self.oracles.iter().map(|o| o.as_ref()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }
}

impl Default for OracleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
