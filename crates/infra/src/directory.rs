use std::collections::HashMap;
use std::sync::RwLock;

use billing_core::{DomainError, DomainResult, Entity};
use billing_parties::{Customer, CustomerDirectory, CustomerId};

/// In-memory customer master data for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    inner: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a customer by identifier.
    pub fn upsert(&self, customer: Customer) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("customer directory lock poisoned"))?;
        map.insert(*customer.id(), customer);
        Ok(())
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn customer(&self, id: &CustomerId) -> Option<Customer> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }
}
