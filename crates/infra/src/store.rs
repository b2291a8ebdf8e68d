//! In-memory invoice storage.

use std::collections::HashMap;
use std::sync::RwLock;

use billing_core::{AggregateId, AggregateRoot, DomainError, DomainResult, ExpectedVersion};
use billing_invoicing::{Invoice, InvoiceHistory, InvoiceId};
use billing_parties::CustomerId;
use billing_reporting::{
    aggregate_sales, ReportError, SalesAggregationSource, SalesQuery, SalesRecord,
};

/// Invoice documents keyed by identifier, for tests/dev.
///
/// `commit` is the unit of work: the version check, identifier assignment and
/// write happen under one lock.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &InvoiceId) -> Option<Invoice> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    pub fn list(&self) -> Vec<Invoice> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    /// Persist `invoice`, assigning an identifier on first save.
    ///
    /// `expected` is checked against the stored version; a new invoice is at version 0.
    pub fn commit(&self, mut invoice: Invoice, expected: ExpectedVersion) -> DomainResult<Invoice> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))?;

        let stored_version = match invoice.id() {
            Some(id) => map.get(id).map(|stored| stored.version()).ok_or_else(DomainError::not_found)?,
            None => 0,
        };
        expected.check(stored_version)?;

        let id = match invoice.id_typed() {
            Some(id) => id,
            None => {
                let id = InvoiceId::new(AggregateId::new());
                invoice.assign_id(id)?;
                id
            }
        };
        invoice.record_commit();
        map.insert(id, invoice.clone());
        Ok(invoice)
    }
}

impl InvoiceHistory for InMemoryInvoiceStore {
    fn exists_finalized_invoice(&self, customer: &CustomerId, exclude: Option<&InvoiceId>) -> bool {
        let Ok(map) = self.inner.read() else {
            return false;
        };
        map.iter().any(|(id, invoice)| {
            invoice.is_finalized()
                && invoice.customer().as_ref() == Some(customer)
                && exclude != Some(id)
        })
    }
}

impl SalesAggregationSource for InMemoryInvoiceStore {
    fn run_aggregation_query(&self, query: &SalesQuery) -> Result<Vec<SalesRecord>, ReportError> {
        let map = self
            .inner
            .read()
            .map_err(|_| ReportError::Source("invoice store lock poisoned".to_string()))?;
        Ok(aggregate_sales(map.values(), &query.filters))
    }
}
