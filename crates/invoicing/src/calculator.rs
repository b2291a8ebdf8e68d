//! Line-item arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_core::{money, DomainError, DomainResult};

/// Derived money fields of one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub amount: Decimal,
    pub row_tax: Decimal,
}

/// `amount = qty × rate`, `row_tax = amount × tax_percent / 100`.
///
/// Full precision; nothing is rounded here. Negative inputs are not rejected,
/// they simply flow through the arithmetic. A result outside the `Decimal`
/// range is an `InvariantViolation`.
pub fn compute_line(qty: Decimal, rate: Decimal, tax_percent: Decimal) -> DomainResult<LineAmounts> {
    let amount = qty
        .checked_mul(rate)
        .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
    let row_tax = money::percent_of(amount, tax_percent)?;
    Ok(LineAmounts { amount, row_tax })
}
