//! Stock movement records as delivered by upstream queries

use boxtrail_source::{field_string, record_type, related_id};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::TransactionKind;

/// Customer reference attached to a stock-out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id: Option<String>,
    pub contact_person: Option<String>,
    pub name: Option<String>,
}

/// One stock movement, read-only snapshot of an upstream record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Upstream identifier, not unique across pages
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub box_id: Option<String>,
    pub box_name: Option<String>,
    pub quantity: i64,
    /// Type string as sent by the source, e.g. `STOCK_OUT`
    pub raw_type: String,
    pub is_deletion_flag: Option<bool>,
    /// Legacy reason code; `1` means consumed, `7` means sold
    pub reason_code: Option<String>,
    pub customer_id: Option<String>,
    pub customer_info: Option<CustomerInfo>,
    pub details: Option<String>,
    pub notes: Option<String>,
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            created_at: None,
            item_id: None,
            item_name: None,
            box_id: None,
            box_name: None,
            quantity: 1,
            raw_type: String::new(),
            is_deletion_flag: None,
            reason_code: None,
            customer_id: None,
            customer_info: None,
            details: None,
            notes: None,
        }
    }
}

impl TransactionRecord {
    /// Decode a loosely typed JSON object. Returns `None` for non-objects;
    /// missing or mistyped fields fall back to their defaults.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        let customer_info = value
            .get("customer_info")
            .filter(|v| v.is_object())
            .map(|info| CustomerInfo {
                id: field_string(info, "id"),
                contact_person: non_empty(field_string(info, "contact_person")),
                name: non_empty(field_string(info, "name")),
            });

        Some(Self {
            id: field_string(value, "id").unwrap_or_default(),
            created_at: field_string(value, "created_at").and_then(|s| parse_timestamp(&s)),
            item_id: related_id(value, "item"),
            item_name: related_name(value, "item"),
            box_id: related_id(value, "box"),
            box_name: related_name(value, "box"),
            quantity: value.get("quantity").and_then(parse_quantity).unwrap_or(1),
            raw_type: record_type(value).unwrap_or_default(),
            is_deletion_flag: ["is_deletion", "is_deleted"]
                .iter()
                .find_map(|key| value.get(*key).and_then(parse_flag)),
            reason_code: field_string(value, "reason_code")
                .or_else(|| field_string(value, "reason"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            customer_id: field_string(value, "customer_id")
                .or_else(|| customer_info.as_ref().and_then(|c| c.id.clone())),
            customer_info,
            details: non_empty(field_string(value, "details")),
            notes: non_empty(field_string(value, "notes")),
        })
    }

    /// Decode every object in a payload array, skipping anything else
    pub fn decode_all(values: &[Value]) -> Vec<Self> {
        let records: Vec<Self> = values.iter().filter_map(Self::from_value).collect();
        let skipped = values.len() - records.len();
        if skipped > 0 {
            log::warn!(
                target: "boxtrail::fetch",
                "Skipped {} payload entr{} that were not record objects",
                skipped,
                if skipped == 1 { "y" } else { "ies" }
            );
        }
        records
    }
}

/// A record with its derived classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub transaction_kind: TransactionKind,
    /// Presentation form of the raw type, e.g. `SOFT DELETE`
    pub kind_label: String,
    pub is_deletion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_label: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Related entity name, flat (`item_name`) or nested (`item.name`)
fn related_name(value: &Value, entity: &str) -> Option<String> {
    non_empty(
        field_string(value, &format!("{}_name", entity))
            .or_else(|| value.get(entity).and_then(|nested| field_string(nested, "name"))),
    )
}

fn parse_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Parse the timestamp formats upstream sources are known to send.
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
