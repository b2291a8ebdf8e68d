//! In-memory evaluation of the item sales query.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use billing_invoicing::{Invoice, ItemCode};

use crate::filters::SalesReportFilters;
use crate::query::SalesRecord;

type GroupKey = (ItemCode, Option<String>, Option<String>);

#[derive(Default)]
struct Group {
    total_qty: Decimal,
    total_amount: Decimal,
    total_tax: Decimal,
    invoices: BTreeSet<usize>,
}

/// Group the lines of finalized invoices by `(item, item_name, category)`.
///
/// Drafts are never counted. `invoice_count` is the number of distinct
/// invoices contributing to a group. Output is sorted by `total_amount`
/// descending, then by item code.
pub fn aggregate_sales<'a, I>(invoices: I, filters: &SalesReportFilters) -> Vec<SalesRecord>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for (index, invoice) in invoices.into_iter().enumerate() {
        if !invoice.is_finalized() {
            continue;
        }
        for line in invoice.items() {
            let item = line.item();
            if !filters.matches(invoice.posting_date(), &item.code) {
                continue;
            }
            let key = (item.code.clone(), item.name.clone(), item.category.clone());
            let group = groups.entry(key).or_default();
            group.total_qty += line.qty();
            group.total_amount += line.amount();
            group.total_tax += line.row_tax();
            group.invoices.insert(index);
        }
    }

    let mut records: Vec<SalesRecord> = groups
        .into_iter()
        .map(|((item, item_name, category), group)| SalesRecord {
            item,
            item_name,
            category,
            total_qty: group.total_qty,
            total_amount: group.total_amount,
            total_tax: group.total_tax,
            total_line_total: group.total_amount + group.total_tax,
            invoice_count: group.invoices.len() as u64,
        })
        .collect();
    sort_records(&mut records);
    records
}

/// Highest `total_amount` first; ties by item code so output is stable.
pub fn sort_records(records: &mut [SalesRecord]) {
    records.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.item_name.cmp(&b.item_name))
            .then_with(|| a.category.cmp(&b.category))
    });
}
