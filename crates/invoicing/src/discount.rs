//! Repeat-purchase discount.

use rust_decimal::Decimal;

use billing_core::{money, DomainResult};
use billing_parties::CustomerId;

use crate::invoice::InvoiceId;

/// Read access to a customer's invoice history.
pub trait InvoiceHistory: Send + Sync {
    /// Whether `customer` has any finalized invoice, ignoring `exclude` when given.
    ///
    /// Payment state of the matching invoice does not matter.
    fn exists_finalized_invoice(&self, customer: &CustomerId, exclude: Option<&InvoiceId>) -> bool;
}

/// Flat percentage off the subtotal for customers who bought before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountPolicy {
    percent: Decimal,
}

impl DiscountPolicy {
    pub const REPEAT_PURCHASE_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

    pub fn repeat_purchase() -> Self {
        Self {
            percent: Self::REPEAT_PURCHASE_PERCENT,
        }
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    /// Whether `customer` qualifies on the invoice identified by `current`.
    ///
    /// A never-saved invoice has no identifier, so nothing is excluded.
    pub fn is_eligible(
        &self,
        history: &dyn InvoiceHistory,
        customer: &CustomerId,
        current: Option<&InvoiceId>,
    ) -> bool {
        history.exists_finalized_invoice(customer, current)
    }

    /// Discount amount for a subtotal; zero when there is no customer or no prior purchase.
    pub fn discount_for(
        &self,
        history: &dyn InvoiceHistory,
        customer: Option<&CustomerId>,
        current: Option<&InvoiceId>,
        subtotal: Decimal,
    ) -> DomainResult<Decimal> {
        match customer {
            Some(customer) if self.is_eligible(history, customer, current) => {
                tracing::debug!(%customer, percent = %self.percent, "repeat-purchase discount applies");
                money::percent_of(subtotal, self.percent)
            }
            _ => Ok(Decimal::ZERO),
        }
    }
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self::repeat_purchase()
    }
}
