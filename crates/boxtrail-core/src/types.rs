//! Kind enumerations for stock movements and kind filters

use serde::{Deserialize, Serialize};

/// Canonical kind of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    StockIn,
    StockOut,
    Transfer,
    Update,
    Create,
    Delete,
    SoftDelete,
    PermanentDelete,
    BulkSoftDelete,
    BulkPermanentDelete,
    Unknown,
}

impl Default for TransactionKind {
    fn default() -> Self {
        TransactionKind::Unknown
    }
}

impl TransactionKind {
    /// All kinds, in declaration order
    pub const ALL: [TransactionKind; 11] = [
        TransactionKind::StockIn,
        TransactionKind::StockOut,
        TransactionKind::Transfer,
        TransactionKind::Update,
        TransactionKind::Create,
        TransactionKind::Delete,
        TransactionKind::SoftDelete,
        TransactionKind::PermanentDelete,
        TransactionKind::BulkSoftDelete,
        TransactionKind::BulkPermanentDelete,
        TransactionKind::Unknown,
    ];

    /// Canonical token; normalizing it yields this kind again
    pub fn token(&self) -> &'static str {
        match self {
            TransactionKind::StockIn => "in",
            TransactionKind::StockOut => "out",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Update => "update",
            TransactionKind::Create => "create",
            TransactionKind::Delete => "delete",
            TransactionKind::SoftDelete => "soft_delete",
            TransactionKind::PermanentDelete => "permanent_delete",
            TransactionKind::BulkSoftDelete => "bulk_soft_delete",
            TransactionKind::BulkPermanentDelete => "bulk_permanent_delete",
            TransactionKind::Unknown => "unknown",
        }
    }

    /// Whether this kind belongs to the deletion family
    pub fn is_delete_family(&self) -> bool {
        matches!(
            self,
            TransactionKind::Delete
                | TransactionKind::SoftDelete
                | TransactionKind::PermanentDelete
                | TransactionKind::BulkSoftDelete
                | TransactionKind::BulkPermanentDelete
        )
    }

    /// Presentation label, e.g. `BULK SOFT DELETE`
    pub fn display_label(&self) -> String {
        self.token().replace('_', " ").to_uppercase()
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Kind criterion of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    All,
    In,
    Out,
    Transfer,
    Update,
    Create,
    /// Any deletion, decided by the deletion classifier
    Delete,
}

impl Default for FilterKind {
    fn default() -> Self {
        FilterKind::All
    }
}

impl FilterKind {
    /// Token sent to upstream queries; `None` means no kind filter
    pub fn query_token(&self) -> Option<&'static str> {
        match self {
            FilterKind::All => None,
            FilterKind::In => Some("in"),
            FilterKind::Out => Some("out"),
            FilterKind::Transfer => Some("transfer"),
            FilterKind::Update => Some("update"),
            FilterKind::Create => Some("create"),
            FilterKind::Delete => Some("delete"),
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(FilterKind::All),
            "in" => Ok(FilterKind::In),
            "out" => Ok(FilterKind::Out),
            "transfer" => Ok(FilterKind::Transfer),
            "update" => Ok(FilterKind::Update),
            "create" => Ok(FilterKind::Create),
            "delete" => Ok(FilterKind::Delete),
            _ => Err(format!("Invalid kind filter: {}", s)),
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.query_token().unwrap_or("all"))
    }
}
