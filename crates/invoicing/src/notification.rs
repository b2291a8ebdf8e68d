//! Customer notification on finalization.
//!
//! Delivery is somebody else's job: the composer builds the message and hands
//! it to a [`Mailer`], which queues it. Nothing here can fail a finalization.

use askama::Template;
use chrono::NaiveDate;
use thiserror::Error;

use billing_core::money::format2;
use billing_parties::CustomerDirectory;

use crate::invoice::{Invoice, InvoiceId, InvoiceStatus};

/// Reference type attached to queued mail so it can be traced back to the document.
pub const REFERENCE_TYPE: &str = "Invoice";

/// A message ready for the delivery queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub recipients: Vec<String>,
    pub sender: Option<String>,
    pub subject: String,
    /// HTML body.
    pub body: String,
    pub reference_type: String,
    pub reference_id: String,
    /// Queue for background delivery instead of sending inline.
    pub queued: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationDeliveryError {
    #[error("mail queue unavailable: {0}")]
    Unavailable(String),
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Delivery capability (mail queue).
pub trait Mailer: Send + Sync {
    fn send_notification(&self, mail: OutgoingMail) -> Result<(), NotificationDeliveryError>;
}

/// What happened to the finalization notice. Never an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Queued { recipient: String },
    Disabled,
    NotFinalized,
    SkippedUnsaved,
    SkippedNoCustomer,
    SkippedNoEmail,
    Failed(String),
}

/// Builds the "invoice finalized" mail and hands it to the mailer.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    sender: Option<String>,
    enabled: bool,
}

impl NotificationComposer {
    pub fn new(sender: Option<String>) -> Self {
        Self {
            sender,
            enabled: true,
        }
    }

    /// A composer that only logs and never queues anything.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            enabled: false,
        }
    }

    /// `"Invoice {id} - {status}"`.
    pub fn subject(invoice_id: &InvoiceId, invoice: &Invoice) -> String {
        format!("Invoice {invoice_id} - {}", invoice.status())
    }

    /// HTML body: header block, one table row per line, then the totals.
    pub fn body(
        invoice_id: &InvoiceId,
        invoice: &Invoice,
        customer_name: &str,
    ) -> Result<String, askama::Error> {
        InvoiceEmail {
            invoice_id,
            customer: customer_name,
            posting_date: invoice.posting_date(),
            due_date: invoice.due_date().map(|d| d.to_string()).unwrap_or_default(),
            status: invoice.status(),
            lines: invoice
                .items()
                .iter()
                .map(|line| EmailLine {
                    item: line.item().display_name(),
                    qty: format2(line.qty()),
                    rate: format2(line.rate()),
                    tax_percent: format2(line.tax_percent()),
                    amount: format2(line.amount()),
                    row_tax: format2(line.row_tax()),
                })
                .collect(),
            subtotal: format2(invoice.subtotal()),
            discount: format2(invoice.discount_amount()),
            tax: format2(invoice.tax_amount()),
            grand_total: format2(invoice.grand_total()),
        }
        .render()
    }

    /// Assemble the message for one recipient.
    pub fn compose(
        &self,
        invoice_id: &InvoiceId,
        invoice: &Invoice,
        customer_name: &str,
        recipient: String,
    ) -> Result<OutgoingMail, askama::Error> {
        Ok(OutgoingMail {
            recipients: vec![recipient],
            sender: self.sender.clone(),
            subject: Self::subject(invoice_id, invoice),
            body: Self::body(invoice_id, invoice, customer_name)?,
            reference_type: REFERENCE_TYPE.to_string(),
            reference_id: invoice_id.to_string(),
            queued: true,
        })
    }

    /// Look up the recipient, compose, and queue. Failures are logged and swallowed.
    pub fn notify(
        &self,
        invoice: &Invoice,
        customers: &dyn CustomerDirectory,
        mailer: &dyn Mailer,
    ) -> NotificationOutcome {
        let Some(invoice_id) = invoice.id_typed() else {
            tracing::warn!("invoice has no identifier; skipping notification");
            return NotificationOutcome::SkippedUnsaved;
        };
        if !invoice.is_finalized() {
            tracing::warn!(%invoice_id, "invoice is not finalized; skipping notification");
            return NotificationOutcome::NotFinalized;
        }
        if !self.enabled {
            tracing::info!(%invoice_id, "notifications disabled; skipping send");
            return NotificationOutcome::Disabled;
        }
        let Some(customer_id) = invoice.customer() else {
            tracing::info!(%invoice_id, "invoice has no customer; skipping send");
            return NotificationOutcome::SkippedNoCustomer;
        };
        let Some(recipient) = customers.lookup_customer_email(&customer_id) else {
            tracing::info!(%invoice_id, customer_id = %customer_id, "no email for customer; skipping send");
            return NotificationOutcome::SkippedNoEmail;
        };

        let customer_name = customers
            .customer(&customer_id)
            .map(|c| c.name().to_owned())
            .unwrap_or_else(|| customer_id.to_string());
        let mail = match self.compose(&invoice_id, invoice, &customer_name, recipient.clone()) {
            Ok(mail) => mail,
            Err(err) => {
                tracing::error!(%invoice_id, error = %err, "invoice email render failed");
                return NotificationOutcome::Failed(err.to_string());
            }
        };

        match mailer.send_notification(mail) {
            Ok(()) => {
                tracing::info!(%invoice_id, recipient = %recipient, "queued invoice email");
                NotificationOutcome::Queued { recipient }
            }
            Err(err) => {
                tracing::error!(%invoice_id, error = %err, "invoice email send failed");
                NotificationOutcome::Failed(err.to_string())
            }
        }
    }
}

impl Default for NotificationComposer {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Template)]
#[template(path = "invoice_email.html")]
struct InvoiceEmail<'a> {
    invoice_id: &'a InvoiceId,
    customer: &'a str,
    posting_date: NaiveDate,
    due_date: String,
    status: InvoiceStatus,
    lines: Vec<EmailLine<'a>>,
    subtotal: String,
    discount: String,
    tax: String,
    grand_total: String,
}

struct EmailLine<'a> {
    item: &'a str,
    qty: String,
    rate: String,
    tax_percent: String,
    amount: String,
    row_tax: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{DocStatus, InvoiceStatus, ItemRef, LineItem};
    use billing_core::AggregateId;
    use billing_parties::{ContactInfo, Customer, CustomerId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct OneCustomer(Option<Customer>);

    impl CustomerDirectory for OneCustomer {
        fn customer(&self, id: &CustomerId) -> Option<Customer> {
            self.0.clone().filter(|c| c.id_typed() == *id)
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        fail_with: Option<NotificationDeliveryError>,
    }

    impl Mailer for RecordingMailer {
        fn send_notification(&self, mail: OutgoingMail) -> Result<(), NotificationDeliveryError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(email: Option<&str>) -> Customer {
        Customer::new(
            CustomerId::new(AggregateId::new()),
            "Jane & Co",
            ContactInfo {
                email: email.map(str::to_owned),
                ..ContactInfo::default()
            },
        )
        .unwrap()
    }

    fn finalized_invoice(customer: &Customer) -> Invoice {
        let mut invoice = Invoice::draft(customer.id_typed(), date(2025, 1, 5))
            .with_due_date(date(2025, 2, 4))
            .with_item(LineItem::new(
                ItemRef::new("SKU-1".parse().unwrap()).named("Widget <XL>"),
                dec!(2),
                dec!(100),
                dec!(10),
            ).unwrap())
            .with_item(LineItem::new(
                ItemRef::new("SKU-2".parse().unwrap()),
                dec!(1),
                dec!(50),
                dec!(0),
            ).unwrap());
        invoice.assign_id(InvoiceId::new(AggregateId::new())).unwrap();
        invoice.set_doc_status(DocStatus::Finalized);
        invoice.set_status(InvoiceStatus::Unpaid);
        invoice
    }

    #[test]
    fn subject_carries_id_and_status() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let id = invoice.id_typed().unwrap();
        assert_eq!(
            NotificationComposer::subject(&id, &invoice),
            format!("Invoice {id} - Unpaid")
        );
    }

    #[test]
    fn body_renders_lines_to_two_decimals() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let id = invoice.id_typed().unwrap();
        let body = NotificationComposer::body(&id, &invoice, c.name()).unwrap();

        assert!(body.contains("<b>Customer:</b> Jane &amp; Co"));
        assert!(body.contains("<b>Posting Date:</b> 2025-01-05"));
        assert!(body.contains("<b>Due Date:</b> 2025-02-04"));
        assert!(body.contains("<b>Status:</b> Unpaid"));
        assert!(body.contains("<td>Widget &lt;XL&gt;</td>"));
        assert!(body.contains("<td>SKU-2</td>"));
        assert!(body.contains(">2.00</td>"));
        assert!(body.contains(">100.00</td>"));
        assert!(body.contains(">10.00%</td>"));
        assert!(body.contains(">200.00</td>"));
        assert!(body.contains(">20.00</td>"));
        assert!(body.contains(">0.00%</td>"));
        assert_eq!(body.matches("<tr>").count(), 3);
    }

    #[test]
    fn notify_queues_mail_for_customer_email() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let mailer = RecordingMailer::default();
        let composer = NotificationComposer::new(Some("billing@shop.test".into()));

        let outcome = composer.notify(&invoice, &OneCustomer(Some(c.clone())), &mailer);

        assert_eq!(
            outcome,
            NotificationOutcome::Queued {
                recipient: "jane@example.test".into()
            }
        );
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.recipients, vec!["jane@example.test".to_string()]);
        assert_eq!(mail.sender.as_deref(), Some("billing@shop.test"));
        assert_eq!(mail.reference_type, "Invoice");
        assert_eq!(mail.reference_id, invoice.id_typed().unwrap().to_string());
        assert!(mail.queued);
    }

    #[test]
    fn missing_email_is_skipped_silently() {
        let c = customer(None);
        let invoice = finalized_invoice(&c);
        let mailer = RecordingMailer::default();

        let outcome = NotificationComposer::default().notify(&invoice, &OneCustomer(Some(c)), &mailer);

        assert_eq!(outcome, NotificationOutcome::SkippedNoEmail);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_customer_counts_as_missing_email() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let mailer = RecordingMailer::default();

        let outcome = NotificationComposer::new(None).notify(&invoice, &OneCustomer(None), &mailer);

        assert_eq!(outcome, NotificationOutcome::SkippedNoEmail);
    }

    #[test]
    fn delivery_failure_is_reported_not_raised() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let mailer = RecordingMailer {
            fail_with: Some(NotificationDeliveryError::Unavailable("queue down".into())),
            ..RecordingMailer::default()
        };

        let outcome = NotificationComposer::new(None).notify(&invoice, &OneCustomer(Some(c)), &mailer);

        assert_eq!(
            outcome,
            NotificationOutcome::Failed("mail queue unavailable: queue down".into())
        );
    }

    #[test]
    fn disabled_composer_never_queues() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let mailer = RecordingMailer::default();

        let outcome = NotificationComposer::disabled().notify(&invoice, &OneCustomer(Some(c)), &mailer);

        assert_eq!(outcome, NotificationOutcome::Disabled);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn invoice_without_customer_is_skipped_silently() {
        let c = customer(Some("jane@example.test"));
        let mut invoice = finalized_invoice(&c);
        invoice.set_customer(None);
        let mailer = RecordingMailer::default();

        let outcome = NotificationComposer::default().notify(&invoice, &OneCustomer(Some(c)), &mailer);

        assert_eq!(outcome, NotificationOutcome::SkippedNoCustomer);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn body_escapes_markup_in_names() {
        let c = customer(Some("jane@example.test"));
        let invoice = finalized_invoice(&c);
        let id = invoice.id_typed().unwrap();

        let body = NotificationComposer::body(&id, &invoice, "<script>alert(1)</script>").unwrap();

        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }
}
