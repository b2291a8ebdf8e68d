//! Invoice totals: line recomputation, discount, grand total and status.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use billing_core::{AggregateRoot, DomainError, DomainResult};

use crate::calculator;
use crate::discount::{DiscountPolicy, InvoiceHistory};
use crate::invoice::{Invoice, InvoiceStatus, InvoiceTotals};
use crate::status;

/// Shown when a save is attempted with no line items.
pub const EMPTY_ITEMS_MESSAGE: &str = "Add at least one Item.";
/// Shown when a finalized invoice has no due date.
pub const DUE_DATE_REQUIRED_MESSAGE: &str = "Due Date is required.";

/// Recomputes every derived field on an invoice.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceAggregator {
    discount: DiscountPolicy,
}

impl InvoiceAggregator {
    pub fn new(discount: DiscountPolicy) -> Self {
        Self { discount }
    }

    /// Check the save preconditions without touching the invoice.
    pub fn validate(invoice: &Invoice) -> DomainResult<()> {
        if invoice.items().is_empty() {
            return Err(DomainError::validation(EMPTY_ITEMS_MESSAGE));
        }
        if invoice.is_finalized() && invoice.due_date().is_none() {
            return Err(DomainError::validation(DUE_DATE_REQUIRED_MESSAGE));
        }
        Ok(())
    }

    /// Recompute lines, totals and status in place.
    ///
    /// Preconditions and every amount are computed before anything is
    /// written, so on error (validation or overflow) the invoice is left
    /// exactly as it was.
    pub fn apply_totals_and_status(
        &self,
        invoice: &mut Invoice,
        history: &dyn InvoiceHistory,
        today: NaiveDate,
    ) -> DomainResult<InvoiceTotals> {
        Self::validate(invoice)?;

        let mut line_amounts = Vec::with_capacity(invoice.items().len());
        let mut subtotal = Decimal::ZERO;
        let mut tax_total = Decimal::ZERO;
        for line in invoice.items() {
            let amounts = calculator::compute_line(line.qty(), line.rate(), line.tax_percent())?;
            subtotal = checked_add(subtotal, amounts.amount)?;
            tax_total = checked_add(tax_total, amounts.row_tax)?;
            line_amounts.push(amounts);
        }

        let customer = invoice.customer();
        let discount_amount =
            self.discount
                .discount_for(history, customer.as_ref(), invoice.id(), subtotal)?;

        let totals = InvoiceTotals {
            subtotal,
            tax_amount: tax_total,
            discount_amount,
            grand_total: grand_total(subtotal, discount_amount, tax_total)?,
        };

        for (line, amounts) in invoice.items_mut().iter_mut().zip(line_amounts) {
            line.set_amounts(amounts);
        }
        invoice.set_totals(totals);
        invoice.set_status(status::resolve_for(invoice, today));

        Ok(totals)
    }

    /// Re-derive only the status. Totals of a finalized invoice stay frozen.
    pub fn refresh_status(invoice: &mut Invoice, today: NaiveDate) -> InvoiceStatus {
        let status = status::resolve_for(invoice, today);
        invoice.set_status(status);
        status
    }
}

/// `max(0, subtotal − discount + tax)`.
pub fn grand_total(subtotal: Decimal, discount: Decimal, tax: Decimal) -> DomainResult<Decimal> {
    let total = subtotal
        .checked_sub(discount)
        .and_then(|net| net.checked_add(tax))
        .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;
    Ok(total.max(Decimal::ZERO))
}

fn checked_add(total: Decimal, amount: Decimal) -> DomainResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| DomainError::invariant("invoice total overflow"))
}
