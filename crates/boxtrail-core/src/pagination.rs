//! Page slicing

use serde::Serialize;

/// One page of an ordered list
#[derive(Debug, Serialize)]
pub struct Page<'a, T> {
    pub slice: &'a [T],
    pub total_pages: usize,
}

/// Number of pages needed for `total` records; never less than 1
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    ((total + page_size - 1) / page_size).max(1)
}

/// Slice out page `page` (1-based). Out-of-range pages come back empty;
/// clamping against `total_pages` is the caller's job.
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let total_pages = total_pages(records.len(), page_size);

    if page == 0 || page_size == 0 {
        return Page { slice: &[], total_pages };
    }

    let start = (page - 1).saturating_mul(page_size).min(records.len());
    let end = page.saturating_mul(page_size).min(records.len());

    Page {
        slice: &records[start..end],
        total_pages,
    }
}
