//! Report filters, parsed once at the boundary.

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use billing_invoicing::ItemCode;

use crate::error::ReportError;

pub const FROM_DATE: &str = "from_date";
pub const TO_DATE: &str = "to_date";
pub const ITEM: &str = "item";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed report filters. `None` means "no constraint"; both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesReportFilters {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub item: Option<ItemCode>,
}

impl SalesReportFilters {
    pub fn between(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            from_date: Some(from_date),
            to_date: Some(to_date),
            item: None,
        }
    }

    pub fn for_item(mut self, item: ItemCode) -> Self {
        self.item = Some(item);
        self
    }

    /// Build filters from loosely-typed key/value pairs.
    ///
    /// Keys and values may arrive as text or as UTF-8 bytes; both are decoded
    /// to text here. Empty values mean "no constraint". Unknown keys are ignored.
    pub fn from_raw<I, K, V>(pairs: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let key = decode(key.as_ref(), "<key>")?;
            let value = decode(value.as_ref(), key)?;
            filters.set(key, value)?;
        }
        Ok(filters)
    }

    /// Build filters from a JSON object (`null` values mean "no constraint").
    pub fn from_json(value: &JsonValue) -> Result<Self, ReportError> {
        let map = match value {
            JsonValue::Null => return Ok(Self::default()),
            JsonValue::Object(map) => map,
            _ => return Err(ReportError::invalid_filter("<filters>", "expected an object")),
        };

        let mut filters = Self::default();
        for (key, value) in map {
            match value {
                JsonValue::Null => {}
                JsonValue::String(s) => filters.set(key, s)?,
                other => {
                    return Err(ReportError::invalid_filter(
                        key.as_str(),
                        format!("expected a string, got {other}"),
                    ));
                }
            }
        }
        Ok(filters)
    }

    /// Whether a line on an invoice posted at `posting_date` for `item` is in scope.
    pub fn matches(&self, posting_date: NaiveDate, item: &ItemCode) -> bool {
        self.from_date.is_none_or(|from| posting_date >= from)
            && self.to_date.is_none_or(|to| posting_date <= to)
            && self.item.as_ref().is_none_or(|wanted| wanted == item)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ReportError> {
        let value = value.trim();
        match key {
            FROM_DATE => self.from_date = parse_date(key, value)?,
            TO_DATE => self.to_date = parse_date(key, value)?,
            ITEM => {
                self.item = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .map_err(|e| ReportError::invalid_filter(key, format!("{e}")))?,
                    )
                };
            }
            other => tracing::debug!(key = other, "ignoring unknown report filter"),
        }
        Ok(())
    }
}

fn decode<'a>(raw: &'a [u8], key: &str) -> Result<&'a str, ReportError> {
    core::str::from_utf8(raw).map_err(|e| ReportError::invalid_filter(key, format!("not UTF-8: {e}")))
}

fn parse_date(key: &str, value: &str) -> Result<Option<NaiveDate>, ReportError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|e| ReportError::invalid_filter(key, format!("{value:?}: {e}")))
}
