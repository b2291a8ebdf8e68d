use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_core::{AggregateId, AggregateRoot, DomainError, DomainResult};
use billing_parties::CustomerId;

use crate::calculator::{self, LineAmounts};

/// Invoice identifier, assigned by the document store on first save.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Item master code (e.g. `"SKU-001"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

impl ItemCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for ItemCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Err(DomainError::invalid_id("ItemCode: empty"));
        }
        Ok(Self(code.to_owned()))
    }
}

/// The item a line refers to, as captured on the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub code: ItemCode,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ItemRef {
    pub fn new(code: ItemCode) -> Self {
        Self {
            code,
            name: None,
            category: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Display name, falling back to the item code.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.code.as_str(),
        }
    }
}

/// One item/quantity/rate/tax entry on an invoice.
///
/// `amount` and `row_tax` are derived. Every setter recomputes them, so a line
/// never carries stale derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    item: ItemRef,
    qty: Decimal,
    rate: Decimal,
    tax_percent: Decimal,
    amount: Decimal,
    row_tax: Decimal,
}

impl LineItem {
    /// Fails with `InvariantViolation` when the derived amounts overflow.
    pub fn new(item: ItemRef, qty: Decimal, rate: Decimal, tax_percent: Decimal) -> DomainResult<Self> {
        let amounts = calculator::compute_line(qty, rate, tax_percent)?;
        Ok(Self {
            item,
            qty,
            rate,
            tax_percent,
            amount: amounts.amount,
            row_tax: amounts.row_tax,
        })
    }

    pub fn set_qty(&mut self, qty: Decimal) -> DomainResult<()> {
        self.update(qty, self.rate, self.tax_percent)
    }

    pub fn set_rate(&mut self, rate: Decimal) -> DomainResult<()> {
        self.update(self.qty, rate, self.tax_percent)
    }

    pub fn set_tax_percent(&mut self, tax_percent: Decimal) -> DomainResult<()> {
        self.update(self.qty, self.rate, tax_percent)
    }

    // Inputs change only together with their derived amounts.
    fn update(&mut self, qty: Decimal, rate: Decimal, tax_percent: Decimal) -> DomainResult<()> {
        let amounts = calculator::compute_line(qty, rate, tax_percent)?;
        self.qty = qty;
        self.rate = rate;
        self.tax_percent = tax_percent;
        self.set_amounts(amounts);
        Ok(())
    }

    pub(crate) fn set_amounts(&mut self, amounts: LineAmounts) {
        self.amount = amounts.amount;
        self.row_tax = amounts.row_tax;
    }

    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    pub fn qty(&self) -> Decimal {
        self.qty
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn tax_percent(&self) -> Decimal {
        self.tax_percent
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn row_tax(&self) -> Decimal {
        self.row_tax
    }
}

/// Document lifecycle state. Finalization happens once and is not reversible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    #[default]
    Draft,
    Finalized,
}

/// Derived, user-facing invoice status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Unpaid,
    Overdue,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed money fields of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
}

/// Aggregate root: Invoice. Owns its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: Option<InvoiceId>,
    customer: Option<CustomerId>,
    posting_date: NaiveDate,
    due_date: Option<NaiveDate>,
    items: Vec<LineItem>,
    totals: InvoiceTotals,
    is_paid: bool,
    doc_status: DocStatus,
    status: InvoiceStatus,
    version: u64,
}

impl Invoice {
    /// A new, never-saved draft.
    pub fn draft(customer: CustomerId, posting_date: NaiveDate) -> Self {
        Self {
            id: None,
            customer: Some(customer),
            posting_date,
            due_date: None,
            items: Vec::new(),
            totals: InvoiceTotals::default(),
            is_paid: false,
            doc_status: DocStatus::Draft,
            status: InvoiceStatus::Draft,
            version: 0,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn id_typed(&self) -> Option<InvoiceId> {
        self.id
    }

    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    pub fn posting_date(&self) -> NaiveDate {
        self.posting_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Decimal {
        self.totals.subtotal
    }

    pub fn tax_amount(&self) -> Decimal {
        self.totals.tax_amount
    }

    pub fn discount_amount(&self) -> Decimal {
        self.totals.discount_amount
    }

    pub fn grand_total(&self) -> Decimal {
        self.totals.grand_total
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn doc_status(&self) -> DocStatus {
        self.doc_status
    }

    pub fn is_finalized(&self) -> bool {
        self.doc_status == DocStatus::Finalized
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    /// Point the draft at another customer, or at none.
    pub fn set_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer;
    }

    pub fn push_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub(crate) fn items_mut(&mut self) -> &mut [LineItem] {
        &mut self.items
    }

    /// Give a never-saved invoice its identifier.
    pub fn assign_id(&mut self, id: InvoiceId) -> DomainResult<()> {
        if self.id.is_some() {
            return Err(DomainError::conflict("invoice already has an identifier"));
        }
        self.id = Some(id);
        Ok(())
    }

    /// Bump the version after the store committed this state.
    pub fn record_commit(&mut self) {
        self.version += 1;
    }

    /// External payment action. Only finalized invoices can be paid.
    pub fn mark_paid(&mut self) -> DomainResult<()> {
        if !self.is_finalized() {
            return Err(DomainError::invariant("cannot mark a draft invoice as paid"));
        }
        if self.is_paid {
            return Err(DomainError::conflict("invoice is already paid"));
        }
        self.is_paid = true;
        Ok(())
    }

    pub(crate) fn set_totals(&mut self, totals: InvoiceTotals) {
        self.totals = totals;
    }

    pub(crate) fn set_status(&mut self, status: InvoiceStatus) {
        self.status = status;
    }

    pub(crate) fn set_doc_status(&mut self, doc_status: DocStatus) {
        self.doc_status = doc_status;
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn widget() -> ItemRef {
        ItemRef::new("SKU-001".parse().unwrap())
    }

    #[test]
    fn line_setters_keep_derived_fields_current() {
        let mut line = LineItem::new(widget(), dec!(2), dec!(100), dec!(10)).unwrap();
        assert_eq!(line.amount(), dec!(200));
        assert_eq!(line.row_tax(), dec!(20));

        line.set_qty(dec!(3)).unwrap();
        assert_eq!(line.amount(), dec!(300));
        assert_eq!(line.row_tax(), dec!(30));

        line.set_tax_percent(dec!(0)).unwrap();
        assert_eq!(line.row_tax(), dec!(0));

        line.set_rate(dec!(1.5)).unwrap();
        assert_eq!(line.amount(), dec!(4.5));
    }

    #[test]
    fn overflowing_line_is_rejected() {
        let err = LineItem::new(widget(), Decimal::MAX, dec!(2), dec!(0)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn failed_setter_leaves_line_unchanged() {
        let mut line = LineItem::new(widget(), dec!(2), Decimal::MAX / dec!(4), dec!(0)).unwrap();
        let before = line.clone();

        let err = line.set_qty(dec!(5)).unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(line, before);
    }

    #[test]
    fn display_name_falls_back_to_code() {
        assert_eq!(widget().display_name(), "SKU-001");
        assert_eq!(widget().named("Widget").display_name(), "Widget");
        assert_eq!(widget().named(" ").display_name(), "SKU-001");
    }

    #[test]
    fn item_code_rejects_blank_input() {
        assert!("   ".parse::<ItemCode>().is_err());
        assert_eq!(" SKU-9 ".parse::<ItemCode>().unwrap().as_str(), "SKU-9");
    }

    #[test]
    fn new_draft_has_no_identifier_and_draft_status() {
        let invoice = Invoice::draft(test_customer_id(), test_date());
        assert_eq!(invoice.id(), None);
        assert_eq!(invoice.version(), 0);
        assert_eq!(invoice.doc_status(), DocStatus::Draft);
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn identifier_is_assigned_once() {
        let mut invoice = Invoice::draft(test_customer_id(), test_date());
        let id = InvoiceId::new(AggregateId::new());
        invoice.assign_id(id).unwrap();
        assert_eq!(invoice.id_typed(), Some(id));

        let err = invoice.assign_id(InvoiceId::new(AggregateId::new())).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn cannot_pay_draft_invoice() {
        let mut invoice = Invoice::draft(test_customer_id(), test_date());
        let err = invoice.mark_paid().unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("draft") => {}
            _ => panic!("Expected InvariantViolation for paying a draft"),
        }
        assert!(!invoice.is_paid());
    }

    #[test]
    fn finalized_invoice_can_be_paid_once() {
        let mut invoice = Invoice::draft(test_customer_id(), test_date());
        invoice.set_doc_status(DocStatus::Finalized);
        invoice.mark_paid().unwrap();
        assert!(invoice.is_paid());

        let err = invoice.mark_paid().unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn status_renders_title_case() {
        assert_eq!(InvoiceStatus::Overdue.to_string(), "Overdue");
        assert_eq!(InvoiceStatus::Draft.as_str(), "Draft");
    }
}
