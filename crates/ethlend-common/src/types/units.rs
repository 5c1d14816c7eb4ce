//! Fixed-point unit conversion
//!
//! The ledger stores every amount as an integer count of the asset's smallest
//! unit (`1 USDT = 10^6`, `1 ETH = 10^18`). These helpers move between that
//! representation and [`Decimal`] without going through floating point.

use crate::error::UnitsError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a human-entered decimal string into smallest units.
///
/// Rejects empty input, negative values and more fractional digits than
/// `decimals` allows.
pub fn parse_units(value: &str, decimals: u32) -> Result<u128, UnitsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }

    let amount = Decimal::from_str(trimmed)
        .map_err(|_| UnitsError::InvalidNumber(trimmed.to_string()))?;
    to_fixed(amount, decimals)
}

/// Convert a decimal amount into smallest units
pub fn to_fixed(amount: Decimal, decimals: u32) -> Result<u128, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > decimals {
        return Err(UnitsError::TooManyDecimals {
            value: amount.to_string(),
            decimals,
        });
    }

    let mantissa = u128::try_from(amount.mantissa().abs()).map_err(|_| UnitsError::Overflow)?;
    let factor = 10u128
        .checked_pow(decimals - scale)
        .ok_or(UnitsError::Overflow)?;
    mantissa.checked_mul(factor).ok_or(UnitsError::Overflow)
}

/// Convert smallest units into a normalized decimal amount
pub fn format_units(raw: u128, decimals: u32) -> Result<Decimal, UnitsError> {
    let mantissa = i128::try_from(raw).map_err(|_| UnitsError::Overflow)?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|_| UnitsError::Overflow)
}
