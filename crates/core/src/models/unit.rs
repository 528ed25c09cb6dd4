use rust_decimal::Decimal;

use crate::errors::CoreError;

/// Largest scale a `Decimal` can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Decimal places of the standard ERC-20 / ether denomination.
pub const DEFAULT_DECIMALS: u32 = 18;

/// The token's smallest-unit denomination (`UNIT_SCALE = 10^decimals`).
///
/// On-chain values are recorded as integers in the smallest unit. This type
/// divides them down to human-readable token amounts without going through
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenUnit {
    decimals: u32,
}

impl TokenUnit {
    pub fn new(decimals: u32) -> Result<Self, CoreError> {
        if decimals > MAX_DECIMALS {
            return Err(CoreError::ValidationError(format!(
                "Token decimals must be at most {MAX_DECIMALS}, got {decimals}"
            )));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// The divisor applied to smallest-unit integers.
    pub fn scale(&self) -> u128 {
        10u128.pow(self.decimals)
    }

    /// Convert a smallest-unit integer into token units.
    ///
    /// Integer and fractional parts are converted separately; a raw
    /// 18-decimal amount can exceed the 96-bit decimal mantissa.
    pub fn to_tokens(&self, raw: u128) -> Result<Decimal, CoreError> {
        let scale = self.scale();
        let whole = i128::try_from(raw / scale)
            .ok()
            .and_then(|w| Decimal::try_from_i128_with_scale(w, 0).ok())
            .ok_or_else(|| {
                CoreError::Arithmetic(format!("{raw} smallest units do not fit a decimal"))
            })?;
        let frac = Decimal::try_from_i128_with_scale((raw % scale) as i128, self.decimals)
            .map_err(|e| CoreError::Arithmetic(e.to_string()))?;

        whole
            .checked_add(frac)
            .ok_or_else(|| CoreError::Arithmetic(format!("{raw} smallest units overflow")))
    }
}

impl Default for TokenUnit {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}
