//! Invoice status derivation.

use chrono::NaiveDate;

use crate::invoice::{DocStatus, Invoice, InvoiceStatus};

/// Derive the status from lifecycle state, payment flag and due date.
///
/// - not finalized: `Draft`
/// - finalized and paid: `Paid`
/// - finalized, unpaid, due date before `today`: `Overdue`
/// - otherwise: `Unpaid`
///
/// Only calendar dates are compared. A finalized invoice always has a due
/// date; if one is missing anyway the invoice is treated as not yet due.
pub fn resolve_status(
    doc_status: DocStatus,
    is_paid: bool,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> InvoiceStatus {
    match doc_status {
        DocStatus::Draft => InvoiceStatus::Draft,
        DocStatus::Finalized if is_paid => InvoiceStatus::Paid,
        DocStatus::Finalized => match due_date {
            Some(due) if due < today => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Unpaid,
        },
    }
}

/// [`resolve_status`] for an invoice's current fields.
pub fn resolve_for(invoice: &Invoice, today: NaiveDate) -> InvoiceStatus {
    resolve_status(
        invoice.doc_status(),
        invoice.is_paid(),
        invoice.due_date(),
        today,
    )
}
