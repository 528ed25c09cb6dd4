use rust_decimal::Decimal;
use tracing::warn;

use crate::errors::CoreError;
use crate::providers::registry::OracleRegistry;

/// Looks up a token's unit price across the registered oracles.
///
/// A zero price counts as a failed lookup. When no oracle yields a positive
/// price the request is refused with `PricingUnavailable`.
pub struct PriceService {
    registry: OracleRegistry,
}

impl PriceService {
    pub fn new(registry: OracleRegistry) -> Self {
        Self { registry }
    }

    /// Names of the registered oracles, in fallback order.
    pub fn oracle_names(&self) -> Vec<String> {
        self.registry
            .oracles()
            .iter()
            .map(|o| o.name().to_string())
            .collect()
    }

    /// Current price of `token` in `currency`.
    ///
    /// Tries oracles in registration order and returns the first positive,
    /// finite price.
    pub async fn get_unit_price(&self, token: &str, currency: &str) -> Result<Decimal, CoreError> {
        let oracles = self.registry.oracles();
        if oracles.is_empty() {
            return Err(CoreError::NoProvider);
        }

        for oracle in &oracles {
            match oracle.get_unit_price(token, currency).await {
                Ok(price) if price > Decimal::ZERO => return Ok(price),
                Ok(price) => {
                    warn!(oracle = oracle.name(), %price, token, "oracle returned a non-positive price");
                }
                Err(e) => {
                    warn!(oracle = oracle.name(), error = %e, token, "price lookup failed");
                }
            }
        }

        Err(CoreError::PricingUnavailable(format!(
            "no oracle returned a positive {currency} price for {token}"
        )))
    }
}
