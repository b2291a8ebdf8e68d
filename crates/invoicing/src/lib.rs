//! Invoicing domain module.
//!
//! Line-item arithmetic, the repeat-purchase discount, invoice totals, status
//! derivation and the finalization notice, implemented as deterministic domain
//! logic. Storage, mail transport and "today" are injected capabilities.

pub mod calculator;
pub mod discount;
pub mod hooks;
pub mod invoice;
pub mod notification;
pub mod status;
pub mod totals;

pub use calculator::{compute_line, LineAmounts};
pub use discount::{DiscountPolicy, InvoiceHistory};
pub use hooks::BillingHooks;
pub use invoice::{
    DocStatus, Invoice, InvoiceId, InvoiceStatus, InvoiceTotals, ItemCode, ItemRef, LineItem,
};
pub use notification::{
    Mailer, NotificationComposer, NotificationDeliveryError, NotificationOutcome, OutgoingMail,
};
pub use status::resolve_status;
pub use totals::{InvoiceAggregator, DUE_DATE_REQUIRED_MESSAGE, EMPTY_ITEMS_MESSAGE};
