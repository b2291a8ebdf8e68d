//! Item sales report.
//!
//! Aggregates line items of finalized invoices by item over an optional date
//! range and renders the result as `(columns, rows)` for a report table.

pub mod aggregate;
pub mod error;
pub mod filters;
pub mod query;
pub mod report;

pub use aggregate::aggregate_sales;
pub use error::ReportError;
pub use filters::SalesReportFilters;
pub use query::{SalesAggregationSource, SalesQuery, SalesRecord, ITEM_SALES_SQL};
pub use report::{columns, execute, execute_raw, FieldType, ReportColumn, ReportOutput, ReportValue};
