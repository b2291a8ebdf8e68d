//! Currency helpers.
//!
//! Amounts are carried at full precision; rounding to cents happens only when
//! a value is rendered for a person to read.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Number of fractional digits used when rendering currency, quantities and percentages.
pub const DISPLAY_SCALE: u32 = 2;

/// Round to two places (banker's rounding) and pin the scale so `2` renders as `2.00`.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(DISPLAY_SCALE);
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

/// Render a value with exactly two fractional digits.
pub fn format2(value: Decimal) -> String {
    round2(value).to_string()
}

/// `amount × percent / 100`, at full precision.
///
/// The percentage is scaled down first, so the result is representable
/// whenever it fits in a `Decimal`.
pub fn percent_of(amount: Decimal, percent: Decimal) -> DomainResult<Decimal> {
    percent
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|rate| amount.checked_mul(rate))
        .ok_or_else(|| DomainError::invariant("percentage amount overflow"))
}
