//! Report entry point: `(columns, rows)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::sort_records;
use crate::error::ReportError;
use crate::filters::SalesReportFilters;
use crate::query::{SalesAggregationSource, SalesQuery, SalesRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Link,
    Data,
    Float,
    Currency,
    Int,
}

/// Column metadata for the report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumn {
    pub fieldname: &'static str,
    pub label: &'static str,
    #[serde(rename = "fieldtype")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static str>,
    pub width: u32,
}

const fn column(
    fieldname: &'static str,
    label: &'static str,
    field_type: FieldType,
    width: u32,
) -> ReportColumn {
    ReportColumn {
        fieldname,
        label,
        field_type,
        options: None,
        width,
    }
}

/// The eight report columns, in row order.
pub fn columns() -> Vec<ReportColumn> {
    vec![
        ReportColumn {
            options: Some("Item"),
            ..column("item", "Item", FieldType::Link, 200)
        },
        column("item_name", "Item Name", FieldType::Data, 250),
        column("category", "Category", FieldType::Data, 150),
        column("total_qty", "Total Qty", FieldType::Float, 100),
        column("total_amount", "Total Amount", FieldType::Currency, 150),
        column("total_tax", "Total Tax", FieldType::Currency, 120),
        column("total_line_total", "Line Total", FieldType::Currency, 150),
        column("invoice_count", "Invoice Count", FieldType::Int, 120),
    ]
}

/// One cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Null,
    Text(String),
    Number(Decimal),
    Int(u64),
}

impl From<Option<String>> for ReportValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(ReportValue::Null, ReportValue::Text)
    }
}

impl From<SalesRecord> for Vec<ReportValue> {
    fn from(record: SalesRecord) -> Self {
        vec![
            ReportValue::Text(record.item.to_string()),
            record.item_name.into(),
            record.category.into(),
            ReportValue::Number(record.total_qty),
            ReportValue::Number(record.total_amount),
            ReportValue::Number(record.total_tax),
            ReportValue::Number(record.total_line_total),
            ReportValue::Int(record.invoice_count),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutput {
    pub columns: Vec<ReportColumn>,
    pub data: Vec<Vec<ReportValue>>,
}

/// Run the item sales report.
pub fn execute(
    filters: &SalesReportFilters,
    source: &dyn SalesAggregationSource,
) -> Result<ReportOutput, ReportError> {
    let query = SalesQuery::item_sales(filters.clone());
    let mut records = source.run_aggregation_query(&query)?;
    sort_records(&mut records);
    tracing::debug!(rows = records.len(), ?filters, "item sales report executed");

    Ok(ReportOutput {
        columns: columns(),
        data: records.into_iter().map(Vec::from).collect(),
    })
}

/// [`execute`] for loosely-typed filters (text or byte keys).
pub fn execute_raw<I, K, V>(
    pairs: I,
    source: &dyn SalesAggregationSource,
) -> Result<ReportOutput, ReportError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let filters = SalesReportFilters::from_raw(pairs)?;
    execute(&filters, source)
}
