//! Parties domain module (customers).
//!
//! Customers are read-only from the billing core's point of view: invoices
//! reference them for discount eligibility and for the notification recipient.

pub mod customer;

pub use customer::{ContactInfo, Customer, CustomerDirectory, CustomerId};
