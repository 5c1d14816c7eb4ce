//! Collateral requirement for a new loan
//!
//! ```text
//! required_eth = borrow_usdt × collateral_factor / 100 / eth_price
//! ```

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Decimal places of the collateral amount prefilled for the user
pub const COLLATERAL_DISPLAY_DP: u32 = 6;

/// ETH collateral needed to borrow `borrow_amount` USDT at `price`.
///
/// `None` when the price is not positive or the amount is not a non-negative
/// decimal. `None` means "not known yet" and is distinct from zero.
pub fn required_collateral(
    borrow_amount: &str,
    price: Decimal,
    collateral_factor_percent: u32,
) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }

    let amount = Decimal::from_str(borrow_amount.trim()).ok()?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }

    amount
        .checked_mul(Decimal::from(collateral_factor_percent))?
        .checked_div(dec!(100))?
        .checked_div(price)
}

/// Round a requirement to the precision offered to the user
pub fn round_collateral(required: Decimal) -> Decimal {
    required
        .round_dp_with_strategy(COLLATERAL_DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
