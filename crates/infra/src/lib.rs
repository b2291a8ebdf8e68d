//! Infrastructure layer: in-memory adapters, configuration and the document
//! service that runs the billing hooks around each commit.

pub mod config;
pub mod directory;
pub mod documents;
pub mod mailer;
pub mod store;

pub use config::BillingConfig;
pub use directory::InMemoryCustomerDirectory;
pub use documents::{FinalizeReceipt, InvoiceDocuments};
pub use mailer::QueuedMailer;
pub use store::InMemoryInvoiceStore;
