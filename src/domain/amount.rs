//! Token Amount Conversion
//!
//! Converts between human-readable decimal amounts and base units (wei)
//! using per-token decimals. Conversion to base units always rounds down
//! so a swap can never spend more than the configured amount.

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Largest token decimals we accept: Decimal's maximum scale. 10^28 is the
/// biggest power of ten that still fits Decimal's 96-bit mantissa; larger
/// decimals cannot be converted exactly in either direction.
const MAX_DECIMALS: u8 = 28;

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("amount must be positive, got {0}")]
    NotPositive(Decimal),
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
    #[error("amount {amount} with {decimals} decimals overflows base units")]
    Overflow { amount: Decimal, decimals: u8 },
    #[error("base unit value {0} too large to render as a decimal")]
    TooLarge(U256),
}

/// Convert a human-readable amount into base units, rounding down.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(amount));
    }
    let scale = scale_factor(decimals)?;

    let scaled = amount
        .checked_mul(Decimal::from(scale))
        .ok_or(AmountError::Overflow { amount, decimals })?;

    // trunc() drops the fractional part; for positive values that is
    // round-toward-zero, i.e. round down.
    let integral = scaled.trunc();
    let wei = integral
        .to_u128()
        .ok_or(AmountError::Overflow { amount, decimals })?;

    Ok(U256::from(wei))
}

/// Convert base units back into a human-readable amount (for display).
pub fn from_base_units(wei: U256, decimals: u8) -> Result<Decimal, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    let raw: u128 = wei.try_into().map_err(|_| AmountError::TooLarge(wei))?;
    let raw = i128::try_from(raw).map_err(|_| AmountError::TooLarge(wei))?;

    Decimal::try_from_i128_with_scale(raw, decimals as u32)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::TooLarge(wei))
}

fn scale_factor(decimals: u8) -> Result<u128, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    10u128
        .checked_pow(decimals as u32)
        .ok_or(AmountError::UnsupportedDecimals(decimals))
}
