//! Attribution ("who/why") for stock-outs and deletions
//!
//! Each strategy looks at one data source and either produces a label or
//! passes. [`extract_attribution`] runs them in [`STRATEGIES`] order and
//! stops at the first non-empty label.

use regex::Regex;

use super::models::TransactionRecord;
use super::types::TransactionKind;

/// Legacy reason codes that carry meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Consumed,
    Sold,
}

impl Reason {
    /// Recognizes `1`/`CONSUMED` and `7`/`SOLD`; nothing else
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "1" | "CONSUMED" => Some(Reason::Consumed),
            "7" | "SOLD" => Some(Reason::Sold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reason::Consumed => "Consumed",
            Reason::Sold => "Sold",
        }
    }
}

/// A single attribution strategy
pub type Strategy = fn(&TransactionRecord, TransactionKind) -> Option<String>;

/// Strategies in the order they are tried
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("customer_info", from_customer_info),
    ("details_phrase", from_details),
    ("customer_reason", from_customer_reason),
    ("notes_phrase", from_notes),
    ("stock_out_reason", from_stock_out_reason),
];

/// Derive the attribution label of a record, if any strategy yields one
pub fn extract_attribution(record: &TransactionRecord, kind: TransactionKind) -> Option<String> {
    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(record, kind).filter(|label| !label.is_empty()))
}

/// Structured customer info: contact person, else customer name
pub fn from_customer_info(record: &TransactionRecord, _kind: TransactionKind) -> Option<String> {
    let info = record.customer_info.as_ref()?;
    trimmed(info.contact_person.as_deref()).or_else(|| trimmed(info.name.as_deref()))
}

/// `CONSUMED by <X>` / `SOLD to <X>` inside the details text
pub fn from_details(record: &TransactionRecord, _kind: TransactionKind) -> Option<String> {
    record.details.as_deref().and_then(match_phrase)
}

/// Customer id plus a recognized reason code
pub fn from_customer_reason(record: &TransactionRecord, _kind: TransactionKind) -> Option<String> {
    let customer_id = trimmed(record.customer_id.as_deref())?;
    record
        .reason_code
        .as_deref()
        .and_then(Reason::from_code)
        .map(|_| format!("Customer #{}", customer_id))
}

/// Same phrases as [`from_details`], inside the notes text
pub fn from_notes(record: &TransactionRecord, _kind: TransactionKind) -> Option<String> {
    record.notes.as_deref().and_then(match_phrase)
}

/// Bare reason label for stock-outs that carry no customer id
pub fn from_stock_out_reason(record: &TransactionRecord, kind: TransactionKind) -> Option<String> {
    if kind != TransactionKind::StockOut || trimmed(record.customer_id.as_deref()).is_some() {
        return None;
    }
    record
        .reason_code
        .as_deref()
        .and_then(Reason::from_code)
        .map(|reason| reason.label().to_string())
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Name following `CONSUMED by` or `SOLD to`, up to the end of the clause
fn match_phrase(text: &str) -> Option<String> {
    static PHRASE: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    let phrase = PHRASE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:consumed\s+by|sold\s+to)\s+([^,;|(\r\n]+)").unwrap()
    });

    phrase
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
