//! Filter state and the per-record inclusion test

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use super::models::AnnotatedRecord;
use super::normalize::fold_separators;
use super::types::{FilterKind, TransactionKind};

/// Raw types that predate the canonical `in` token
const LEGACY_IN_ALIASES: &[&str] = &["new_item"];

/// Active filter criteria and page position.
///
/// Values are never mutated: each `with_*` call returns a new state. Changing
/// any criterion or the page size sends the state back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    kind: FilterKind,
    item_query: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    page: usize,
    page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FilterState {
    /// Unfiltered state on page 1
    pub fn new(page_size: usize) -> Self {
        Self {
            kind: FilterKind::All,
            item_query: String::new(),
            start_date: None,
            end_date: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn item_query(&self) -> &str {
        &self.item_query
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn with_kind(&self, kind: FilterKind) -> Self {
        self.changed(self.kind != kind, |s| s.kind = kind)
    }

    pub fn with_item_query(&self, query: &str) -> Self {
        let query = query.to_string();
        self.changed(self.item_query != query, |s| s.item_query = query)
    }

    pub fn with_start_date(&self, date: Option<NaiveDate>) -> Self {
        self.changed(self.start_date != date, |s| s.start_date = date)
    }

    pub fn with_end_date(&self, date: Option<NaiveDate>) -> Self {
        self.changed(self.end_date != date, |s| s.end_date = date)
    }

    pub fn with_page_size(&self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        self.changed(self.page_size != page_size, |s| s.page_size = page_size)
    }

    /// Move to another page; criteria stay as they are
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    fn changed<F>(&self, differs: bool, apply: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut next = self.clone();
        if differs {
            apply(&mut next);
            next.page = 1;
        }
        next
    }
}

/// Whether a record passes every active criterion
pub fn matches(record: &AnnotatedRecord, state: &FilterState) -> bool {
    matches_kind(record, state.kind)
        && matches_item(record, &state.item_query)
        && matches_dates(record.record.created_at, state.start_date, state.end_date)
}

/// Kind criterion. `delete` defers to the deletion classifier only.
pub fn matches_kind(record: &AnnotatedRecord, kind: FilterKind) -> bool {
    let expected = match kind {
        FilterKind::All => return true,
        FilterKind::Delete => return record.is_deletion,
        FilterKind::In => TransactionKind::StockIn,
        FilterKind::Out => TransactionKind::StockOut,
        FilterKind::Transfer => TransactionKind::Transfer,
        FilterKind::Update => TransactionKind::Update,
        FilterKind::Create => TransactionKind::Create,
    };

    if record.transaction_kind == expected {
        return true;
    }

    kind == FilterKind::In
        && LEGACY_IN_ALIASES.contains(&fold_separators(&record.record.raw_type).as_str())
}

/// Case-insensitive substring match on item name or item id
pub fn matches_item(record: &AnnotatedRecord, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .map(|value| value.to_lowercase().contains(&query))
            .unwrap_or(false)
    };

    contains(&record.record.item_name) || contains(&record.record.item_id)
}

/// Inclusive date range. The end bound is pushed one full day past `end`
/// so the whole end day is covered. Undated records are kept.
pub fn matches_dates(
    created_at: Option<DateTime<Utc>>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> bool {
    let created_at = match created_at {
        Some(ts) => ts,
        None => return true,
    };

    if let Some(lower) = start.and_then(start_of_day) {
        if created_at < lower {
            return false;
        }
    }

    if let Some(upper) = end
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .and_then(start_of_day)
    {
        if created_at > upper {
            return false;
        }
    }

    true
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}
