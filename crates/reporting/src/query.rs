//! Aggregation query contract for SQL-backed and in-memory sources.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_invoicing::ItemCode;

use crate::error::ReportError;
use crate::filters::{SalesReportFilters, FROM_DATE, ITEM, TO_DATE};

/// Item sales over finalized invoices. Named parameters: `:from_date`, `:to_date`, `:item`.
pub const ITEM_SALES_SQL: &str = r#"
SELECT
    li.item_code,
    li.item_name,
    li.category,
    SUM(li.qty)                  AS total_qty,
    SUM(li.amount)               AS total_amount,
    SUM(li.row_tax)              AS total_tax,
    SUM(li.amount + li.row_tax)  AS total_line_total,
    COUNT(DISTINCT inv.id)       AS invoice_count
FROM invoice_line_items AS li
JOIN invoices AS inv
  ON inv.id = li.invoice_id
 AND inv.doc_status = 1
WHERE (:from_date IS NULL OR inv.posting_date >= :from_date)
  AND (:to_date   IS NULL OR inv.posting_date <= :to_date)
  AND (:item      IS NULL OR li.item_code = :item)
GROUP BY li.item_code, li.item_name, li.category
ORDER BY total_amount DESC, li.item_code ASC
"#;

/// A query template plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesQuery {
    pub sql: &'static str,
    pub filters: SalesReportFilters,
}

impl SalesQuery {
    pub fn item_sales(filters: SalesReportFilters) -> Self {
        Self {
            sql: ITEM_SALES_SQL,
            filters,
        }
    }

    /// Named parameters in template order; `None` binds SQL `NULL`.
    pub fn params(&self) -> Vec<(&'static str, Option<String>)> {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        vec![
            (FROM_DATE, date(self.filters.from_date)),
            (TO_DATE, date(self.filters.to_date)),
            (ITEM, self.filters.item.as_ref().map(ItemCode::to_string)),
        ]
    }
}

/// One aggregated group, as returned by the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub item: ItemCode,
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub total_qty: Decimal,
    pub total_amount: Decimal,
    pub total_tax: Decimal,
    pub total_line_total: Decimal,
    pub invoice_count: u64,
}

/// Read-only access to invoice history for reporting.
pub trait SalesAggregationSource: Send + Sync {
    fn run_aggregation_query(&self, query: &SalesQuery) -> Result<Vec<SalesRecord>, ReportError>;
}
