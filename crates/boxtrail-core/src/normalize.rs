//! Type normalization
//!
//! Maps a free-form type string onto a [`TransactionKind`]. Matching is
//! done in a fixed order and the first rule that applies wins:
//!
//! 1. exact canonical token, after folding `-` and spaces into `_`
//! 2. explicit deletion flag
//! 3. substring heuristics, see [`HEURISTICS`]
//! 4. `Unknown`

use super::types::TransactionKind;

/// A substring heuristic
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&str) -> bool,
    pub kind: TransactionKind,
}

/// Exact tokens, matched after [`fold_separators`]
const CANONICAL_TOKENS: &[(&str, TransactionKind)] = &[
    ("in", TransactionKind::StockIn),
    ("out", TransactionKind::StockOut),
    ("transfer", TransactionKind::Transfer),
    ("update", TransactionKind::Update),
    ("create", TransactionKind::Create),
    ("delete", TransactionKind::Delete),
    ("soft_delete", TransactionKind::SoftDelete),
    ("permanent_delete", TransactionKind::PermanentDelete),
    ("bulk_soft_delete", TransactionKind::BulkSoftDelete),
    ("bulk_permanent_delete", TransactionKind::BulkPermanentDelete),
];

fn soft_delete(s: &str) -> bool {
    s.contains("delete") && s.contains("soft")
}

fn delete(s: &str) -> bool {
    s.contains("delete")
}

fn stock_in(s: &str) -> bool {
    s.contains("in") || s.contains("add") || s.contains("create")
}

fn stock_out(s: &str) -> bool {
    s.contains("out") || s.contains("remove")
}

fn transfer(s: &str) -> bool {
    s.contains("transfer")
}

/// Substring heuristics in priority order
pub const HEURISTICS: &[Rule] = &[
    Rule { name: "soft_delete", applies: soft_delete, kind: TransactionKind::SoftDelete },
    Rule { name: "delete", applies: delete, kind: TransactionKind::Delete },
    Rule { name: "stock_in", applies: stock_in, kind: TransactionKind::StockIn },
    Rule { name: "stock_out", applies: stock_out, kind: TransactionKind::StockOut },
    Rule { name: "transfer", applies: transfer, kind: TransactionKind::Transfer },
];

/// Lower-case, trim, and treat `-`, `_` and whitespace as the same separator
pub fn fold_separators(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Exact canonical match only
pub fn canonical_kind(raw_type: &str) -> Option<TransactionKind> {
    let folded = fold_separators(raw_type);
    CANONICAL_TOKENS
        .iter()
        .find(|(token, _)| *token == folded)
        .map(|(_, kind)| *kind)
}

/// Normalize a raw type string into its canonical kind
pub fn normalize(raw_type: &str, is_deletion_flag: Option<bool>) -> TransactionKind {
    if let Some(kind) = canonical_kind(raw_type) {
        return kind;
    }

    if is_deletion_flag == Some(true) {
        return TransactionKind::Delete;
    }

    let folded = fold_separators(raw_type);
    HEURISTICS
        .iter()
        .find(|rule| (rule.applies)(&folded))
        .map(|rule| rule.kind)
        .unwrap_or(TransactionKind::Unknown)
}

/// Presentation form of a raw type string: separators become spaces, upper-cased
pub fn display_type(raw_type: &str) -> String {
    let folded = fold_separators(raw_type);
    if folded.is_empty() {
        return TransactionKind::Unknown.display_label();
    }
    folded.replace('_', " ").to_uppercase()
}
