//! Document lifecycle hooks.
//!
//! The document framework calls these around its own persistence:
//!
//! - `on_validate` on every save,
//! - `on_before_finalize` inside the unit of work that submits the invoice,
//! - `on_after_finalize` once that unit of work committed.
//!
//! The first two return the validation error verbatim and leave the invoice
//! untouched when they fail. The third never fails.

use billing_core::{Clock, DomainResult};
use billing_parties::CustomerDirectory;

use crate::discount::InvoiceHistory;
use crate::invoice::{DocStatus, Invoice, InvoiceStatus, InvoiceTotals};
use crate::notification::{Mailer, NotificationComposer, NotificationOutcome};
use crate::totals::InvoiceAggregator;

/// Collaborators the hooks read from or hand off to.
pub struct BillingHooks<'a> {
    aggregator: InvoiceAggregator,
    composer: NotificationComposer,
    history: &'a dyn InvoiceHistory,
    customers: &'a dyn CustomerDirectory,
    mailer: &'a dyn Mailer,
    clock: &'a dyn Clock,
}

impl<'a> BillingHooks<'a> {
    pub fn new(
        history: &'a dyn InvoiceHistory,
        customers: &'a dyn CustomerDirectory,
        mailer: &'a dyn Mailer,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            aggregator: InvoiceAggregator::default(),
            composer: NotificationComposer::default(),
            history,
            customers,
            mailer,
            clock,
        }
    }

    pub fn with_aggregator(mut self, aggregator: InvoiceAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_composer(mut self, composer: NotificationComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Recompute lines, totals and status.
    pub fn on_validate(&self, invoice: &mut Invoice) -> DomainResult<InvoiceTotals> {
        self.aggregator
            .apply_totals_and_status(invoice, self.history, self.clock.current_date())
    }

    /// Move the invoice to `Finalized` and recompute under the finalization rules
    /// (due date required, payment status instead of `Draft`).
    ///
    /// Works on a copy and only writes it back on success.
    pub fn on_before_finalize(&self, invoice: &mut Invoice) -> DomainResult<InvoiceTotals> {
        let mut staged = invoice.clone();
        staged.set_doc_status(DocStatus::Finalized);
        let totals = self.on_validate(&mut staged)?;
        *invoice = staged;
        Ok(totals)
    }

    /// Payment or the date moved on: re-resolve the status, leave totals alone.
    pub fn on_status_refresh(&self, invoice: &mut Invoice) -> InvoiceStatus {
        InvoiceAggregator::refresh_status(invoice, self.clock.current_date())
    }

    /// Send the customer notice. Failures are logged inside and never raised.
    pub fn on_after_finalize(&self, invoice: &Invoice) -> NotificationOutcome {
        self.composer.notify(invoice, self.customers, self.mailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceId, ItemRef, LineItem};
    use crate::notification::{NotificationDeliveryError, OutgoingMail};
    use crate::totals::{DUE_DATE_REQUIRED_MESSAGE, EMPTY_ITEMS_MESSAGE};
    use billing_core::{AggregateId, DomainError, FixedClock};
    use billing_parties::{ContactInfo, Customer, CustomerId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct NoHistory;

    impl InvoiceHistory for NoHistory {
        fn exists_finalized_invoice(&self, _: &CustomerId, _: Option<&InvoiceId>) -> bool {
            false
        }
    }

    struct Directory(Customer);

    impl CustomerDirectory for Directory {
        fn customer(&self, id: &CustomerId) -> Option<Customer> {
            (self.0.id_typed() == *id).then(|| self.0.clone())
        }
    }

    struct BrokenMailer;

    impl Mailer for BrokenMailer {
        fn send_notification(&self, _: OutgoingMail) -> Result<(), NotificationDeliveryError> {
            Err(NotificationDeliveryError::Rejected("smtp said no".into()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer() -> Customer {
        Customer::new(
            CustomerId::new(AggregateId::new()),
            "Jane",
            ContactInfo {
                email: Some("jane@example.test".into()),
                ..ContactInfo::default()
            },
        )
        .unwrap()
    }

    fn draft(customer: &Customer) -> Invoice {
        Invoice::draft(customer.id_typed(), date(2025, 1, 5)).with_item(LineItem::new(
            ItemRef::new("SKU-1".parse().unwrap()),
            dec!(2),
            dec!(100),
            dec!(10),
        ).unwrap())
    }

    #[test]
    fn validate_is_repeatable() {
        let c = customer();
        let directory = Directory(c.clone());
        let clock = FixedClock(date(2025, 1, 10));
        let hooks = BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &clock);

        let mut invoice = draft(&c);
        let first = hooks.on_validate(&mut invoice).unwrap();
        let snapshot = invoice.clone();
        let second = hooks.on_validate(&mut invoice).unwrap();

        assert_eq!(first, second);
        assert_eq!(invoice, snapshot);
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn before_finalize_requires_due_date_and_keeps_draft_on_error() {
        let c = customer();
        let directory = Directory(c.clone());
        let clock = FixedClock(date(2025, 1, 10));
        let hooks = BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &clock);

        let mut invoice = draft(&c);
        hooks.on_validate(&mut invoice).unwrap();
        let before = invoice.clone();

        let err = hooks.on_before_finalize(&mut invoice).unwrap_err();
        assert_eq!(err, DomainError::validation(DUE_DATE_REQUIRED_MESSAGE));
        assert_eq!(invoice, before);
        assert!(!invoice.is_finalized());
    }

    #[test]
    fn before_finalize_rejects_empty_invoice() {
        let c = customer();
        let directory = Directory(c.clone());
        let clock = FixedClock(date(2025, 1, 10));
        let hooks = BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &clock);

        let mut invoice = Invoice::draft(c.id_typed(), date(2025, 1, 5)).with_due_date(date(2025, 2, 1));
        let err = hooks.on_before_finalize(&mut invoice).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_ITEMS_MESSAGE);
        assert_eq!(invoice.doc_status(), DocStatus::Draft);
    }

    #[test]
    fn before_finalize_moves_to_unpaid_or_overdue() {
        let c = customer();
        let directory = Directory(c.clone());
        let before_due = FixedClock(date(2025, 1, 31));
        let after_due = FixedClock(date(2025, 2, 2));

        let mut on_time = draft(&c).with_due_date(date(2025, 2, 1));
        BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &before_due)
            .on_before_finalize(&mut on_time)
            .unwrap();
        assert_eq!(on_time.doc_status(), DocStatus::Finalized);
        assert_eq!(on_time.status(), InvoiceStatus::Unpaid);

        let mut late = draft(&c).with_due_date(date(2025, 2, 1));
        BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &after_due)
            .on_before_finalize(&mut late)
            .unwrap();
        assert_eq!(late.status(), InvoiceStatus::Overdue);
    }

    #[test]
    fn after_finalize_swallows_delivery_failure() {
        let c = customer();
        let directory = Directory(c.clone());
        let clock = FixedClock(date(2025, 1, 10));
        let hooks = BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &clock);

        let mut invoice = draft(&c).with_due_date(date(2025, 2, 1));
        invoice.assign_id(InvoiceId::new(AggregateId::new())).unwrap();
        hooks.on_before_finalize(&mut invoice).unwrap();

        let outcome = hooks.on_after_finalize(&invoice);
        assert_eq!(
            outcome,
            NotificationOutcome::Failed("delivery rejected: smtp said no".into())
        );
        assert!(invoice.is_finalized());
    }

    #[test]
    fn after_finalize_ignores_drafts() {
        let c = customer();
        let directory = Directory(c.clone());
        let clock = FixedClock(date(2025, 1, 10));
        let hooks = BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &clock);

        let mut invoice = draft(&c);
        invoice.assign_id(InvoiceId::new(AggregateId::new())).unwrap();
        assert_eq!(hooks.on_after_finalize(&invoice), NotificationOutcome::NotFinalized);
    }

    #[test]
    fn status_refresh_keeps_totals_frozen() {
        struct Everyone;

        impl InvoiceHistory for Everyone {
            fn exists_finalized_invoice(&self, _: &CustomerId, _: Option<&InvoiceId>) -> bool {
                true
            }
        }

        let c = customer();
        let directory = Directory(c.clone());
        let submitted_on = FixedClock(date(2025, 1, 10));
        let mut invoice = draft(&c).with_due_date(date(2025, 2, 1));
        BillingHooks::new(&NoHistory, &directory, &BrokenMailer, &submitted_on)
            .on_before_finalize(&mut invoice)
            .unwrap();
        let totals = invoice.totals();

        let later = FixedClock(date(2025, 3, 1));
        let status = BillingHooks::new(&Everyone, &directory, &BrokenMailer, &later)
            .on_status_refresh(&mut invoice);

        assert_eq!(status, InvoiceStatus::Overdue);
        assert_eq!(invoice.status(), InvoiceStatus::Overdue);
        assert_eq!(invoice.totals(), totals);
        assert_eq!(invoice.discount_amount(), dec!(0));
    }
}
