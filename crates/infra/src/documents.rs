//! Document service: runs the billing hooks inside a single commit.
//!
//! ```text
//! save      : on_validate → commit
//! finalize  : on_before_finalize → commit → on_after_finalize
//! mark_paid : mark_paid → on_status_refresh → commit
//! ```
//!
//! A hook error aborts the operation before the commit, so the stored
//! document never sees a partial change.

use std::sync::Arc;

use billing_core::{AggregateRoot, Clock, DomainError, DomainResult, ExpectedVersion};
use billing_invoicing::{
    BillingHooks, Invoice, InvoiceId, NotificationComposer, NotificationOutcome,
};

use crate::config::BillingConfig;
use crate::directory::InMemoryCustomerDirectory;
use crate::mailer::QueuedMailer;
use crate::store::InMemoryInvoiceStore;

/// Result of a successful finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReceipt {
    pub invoice: Invoice,
    pub notification: NotificationOutcome,
}

pub struct InvoiceDocuments {
    store: Arc<InMemoryInvoiceStore>,
    customers: Arc<InMemoryCustomerDirectory>,
    mailer: Arc<QueuedMailer>,
    clock: Arc<dyn Clock>,
    composer: NotificationComposer,
}

impl InvoiceDocuments {
    pub fn new(
        store: Arc<InMemoryInvoiceStore>,
        customers: Arc<InMemoryCustomerDirectory>,
        mailer: Arc<QueuedMailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            customers,
            mailer,
            clock,
            composer: NotificationComposer::default(),
        }
    }

    /// Apply notification settings from configuration.
    pub fn configured(mut self, config: &BillingConfig) -> Self {
        self.composer = if config.notifications_enabled {
            NotificationComposer::new(config.mail_sender.clone())
        } else {
            NotificationComposer::disabled()
        };
        self
    }

    fn hooks(&self) -> BillingHooks<'_> {
        BillingHooks::new(
            self.store.as_ref(),
            self.customers.as_ref(),
            self.mailer.as_ref(),
            self.clock.as_ref(),
        )
        .with_composer(self.composer.clone())
    }

    pub fn get(&self, id: &InvoiceId) -> DomainResult<Invoice> {
        self.store.get(id).ok_or_else(DomainError::not_found)
    }

    /// Validate and store a draft. New drafts get their identifier here.
    pub fn save(&self, mut invoice: Invoice) -> DomainResult<Invoice> {
        if invoice.is_finalized() {
            return Err(DomainError::conflict("cannot modify a finalized invoice"));
        }
        if let Some(id) = invoice.id_typed() {
            if self.get(&id)?.is_finalized() {
                return Err(DomainError::conflict("cannot modify a finalized invoice"));
            }
        }

        self.hooks().on_validate(&mut invoice)?;
        let expected = ExpectedVersion::Exact(invoice.version());
        let saved = self.store.commit(invoice, expected)?;
        tracing::info!(invoice_id = ?saved.id_typed(), version = saved.version(), "invoice saved");
        Ok(saved)
    }

    /// Submit a stored draft. The customer notice goes out after the commit.
    pub fn finalize(&self, id: &InvoiceId) -> DomainResult<FinalizeReceipt> {
        let mut invoice = self.get(id)?;
        if invoice.is_finalized() {
            return Err(DomainError::conflict("invoice is already finalized"));
        }

        let hooks = self.hooks();
        let expected = ExpectedVersion::Exact(invoice.version());
        hooks.on_before_finalize(&mut invoice)?;
        let committed = self.store.commit(invoice, expected)?;
        tracing::info!(invoice_id = %id, status = %committed.status(), "invoice finalized");

        let notification = hooks.on_after_finalize(&committed);
        Ok(FinalizeReceipt {
            invoice: committed,
            notification,
        })
    }

    /// Record payment of a finalized invoice.
    pub fn mark_paid(&self, id: &InvoiceId) -> DomainResult<Invoice> {
        let mut invoice = self.get(id)?;
        let expected = ExpectedVersion::Exact(invoice.version());
        invoice.mark_paid()?;
        self.hooks().on_status_refresh(&mut invoice);
        let committed = self.store.commit(invoice, expected)?;
        tracing::info!(invoice_id = %id, "invoice marked paid");
        Ok(committed)
    }

    /// Re-derive the status of every finalized invoice against today's date.
    ///
    /// Returns the number of invoices whose status changed.
    pub fn refresh_statuses(&self) -> DomainResult<usize> {
        let hooks = self.hooks();
        let mut changed = 0;
        for mut invoice in self.store.list().into_iter().filter(Invoice::is_finalized) {
            let before = invoice.status();
            let expected = ExpectedVersion::Exact(invoice.version());
            if hooks.on_status_refresh(&mut invoice) != before {
                tracing::info!(
                    invoice_id = ?invoice.id_typed(),
                    from = %before,
                    to = %invoice.status(),
                    "invoice status changed"
                );
                self.store.commit(invoice, expected)?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
