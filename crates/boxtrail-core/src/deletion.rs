//! Deletion classification
//!
//! A record counts as a deletion when any one of three signals says so,
//! regardless of which kind the normalizer settled on. This is the
//! predicate behind the `delete` filter and deletion row emphasis.

use super::models::TransactionRecord;
use super::normalize::normalize;
use super::types::TransactionKind;

/// Classify with an already-normalized kind
pub fn classify(record: &TransactionRecord, kind: TransactionKind) -> bool {
    record.is_deletion_flag == Some(true)
        || kind.is_delete_family()
        || record.raw_type.to_lowercase().contains("delete")
}

/// Whether a record represents a deletion
pub fn is_deletion(record: &TransactionRecord) -> bool {
    classify(record, normalize(&record.raw_type, record.is_deletion_flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw_type: &str, flag: Option<bool>) -> TransactionRecord {
        TransactionRecord {
            raw_type: raw_type.to_string(),
            is_deletion_flag: flag,
            ..Default::default()
        }
    }

    #[test]
    fn test_bulk_soft_delete_without_flag() {
        assert!(is_deletion(&record("BULK_SOFT_DELETE", None)));
    }

    #[test]
    fn test_flag_alone_is_enough() {
        assert!(is_deletion(&record("out", Some(true))));
        assert!(is_deletion(&record("", Some(true))));
    }

    #[test]
    fn test_raw_type_substring_is_enough() {
        let r = record("ItemDeleted", None);
        assert!(classify(&r, TransactionKind::Unknown));
    }

    #[test]
    fn test_family_kind_is_enough() {
        assert!(classify(&record("purge", None), TransactionKind::PermanentDelete));
    }

    #[test]
    fn test_plain_movements_are_not_deletions() {
        for raw in ["in", "STOCK_OUT", "transfer", "update", "create", ""] {
            assert!(!is_deletion(&record(raw, None)), "raw type {:?}", raw);
            assert!(!is_deletion(&record(raw, Some(false))), "raw type {:?}", raw);
        }
    }

    #[test]
    fn test_invariant_over_fixture_table() {
        let raws = ["in", "out", "soft-delete", "removed", "delete_all", "bulk_permanent_delete", "x"];
        for raw in raws {
            for flag in [None, Some(false), Some(true)] {
                let r = record(raw, flag);
                let kind = normalize(raw, flag);
                let expected = kind.is_delete_family()
                    || raw.to_lowercase().contains("delete")
                    || flag == Some(true);
                assert_eq!(is_deletion(&r), expected, "{:?} {:?}", raw, flag);
            }
        }
    }
}
