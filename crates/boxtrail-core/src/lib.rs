//! boxtrail-core - stock movement history engine
//!
//! Turns loosely-shaped transaction records into annotated ones
//! (canonical kind, deletion flag, attribution), then filters, orders
//! and paginates them for display.

pub mod attribution;
pub mod deletion;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod pagination;
pub mod session;
pub mod types;

pub use attribution::extract_attribution;
pub use deletion::{classify, is_deletion};
pub use error::{
    CoreError, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorDetails, ErrorLogger,
    ErrorSeverity,
};
pub use fetch::{FetchAggregator, FetchFilters, FetchOutcome, FetchScope};
pub use filter::{matches, FilterState};
pub use models::{AnnotatedRecord, CustomerInfo, TransactionRecord};
pub use normalize::{display_type, normalize};
pub use pagination::{paginate, total_pages, Page};
pub use session::{EmptyState, FetchTicket, LoadStatus, Projection, TransactionView};
pub use types::{FilterKind, TransactionKind};

/// Attach kind, deletion flag, display label and attribution to a record.
///
/// Attribution is only derived for stock-outs and deletions.
pub fn annotate(record: TransactionRecord) -> AnnotatedRecord {
    let transaction_kind = normalize(&record.raw_type, record.is_deletion_flag);
    let is_deletion = classify(&record, transaction_kind);
    let attribution_label = if transaction_kind == TransactionKind::StockOut || is_deletion {
        extract_attribution(&record, transaction_kind)
    } else {
        None
    };

    AnnotatedRecord {
        kind_label: display_type(&record.raw_type),
        record,
        transaction_kind,
        is_deletion,
        attribution_label,
    }
}

pub fn annotate_all(records: Vec<TransactionRecord>) -> Vec<AnnotatedRecord> {
    records.into_iter().map(annotate).collect()
}
