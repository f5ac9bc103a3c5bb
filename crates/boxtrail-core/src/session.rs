//! Transaction view session
//!
//! Holds one fetched record set together with the active [`FilterState`]
//! and turns them into the projection a renderer consumes. Fetches are
//! tagged with an epoch; under [`StalePolicy::LastSettledWins`] every settled
//! response replaces the record set in settle order, whichever request it
//! answers. [`StalePolicy::DiscardStale`] drops responses older than the
//! newest one already applied.

use boxtrail_config::StalePolicy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tokio::sync::watch;

use super::error::ErrorCode;
use super::fetch::{FetchAggregator, FetchFilters, FetchOutcome, FetchScope};
use super::filter::{matches, FilterState};
use super::models::AnnotatedRecord;
use super::pagination::{paginate, total_pages};

/// State of the last applied fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loaded,
    Failed(ErrorCode),
}

/// Why a projection has no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// Records loaded but none pass the filters
    NoMatchingRecords,
    /// The records could not be loaded
    LoadFailed,
}

/// Handle for one in-flight fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket {
    epoch: u64,
}

impl FetchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What the renderer gets
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub page_records: Vec<AnnotatedRecord>,
    pub total_filtered_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
}

pub struct TransactionView {
    records: Vec<AnnotatedRecord>,
    filter: FilterState,
    status: LoadStatus,
    policy: StalePolicy,
    issued_epoch: u64,
    settled_epoch: Option<u64>,
    count: watch::Sender<usize>,
}

impl TransactionView {
    pub fn new(filter: FilterState, policy: StalePolicy) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            records: Vec::new(),
            filter,
            status: LoadStatus::Idle,
            policy,
            issued_epoch: 0,
            settled_epoch: None,
            count,
        }
    }

    /// Receive the filtered record count whenever it changes
    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Records of the last applied fetch, unfiltered
    pub fn records(&self) -> &[AnnotatedRecord] {
        &self.records
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.publish_count();
    }

    /// Tag a new fetch
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_epoch += 1;
        FetchTicket {
            epoch: self.issued_epoch,
        }
    }

    /// Apply a settled fetch. Returns `false` when the response was dropped.
    pub fn settle(&mut self, ticket: FetchTicket, outcome: FetchOutcome) -> bool {
        if self.policy == StalePolicy::DiscardStale
            && self.settled_epoch.map_or(false, |settled| ticket.epoch < settled)
        {
            log::debug!(
                target: "boxtrail::fetch",
                "Dropping stale response for fetch #{} (newest applied #{:?})",
                ticket.epoch,
                self.settled_epoch
            );
            return false;
        }

        self.settled_epoch = Some(ticket.epoch);
        self.status = match outcome.failure {
            Some(code) => LoadStatus::Failed(code),
            None => LoadStatus::Loaded,
        };
        self.records = crate::annotate_all(outcome.records);
        self.publish_count();
        true
    }

    /// Fetch and apply in one step
    pub async fn refresh(
        &mut self,
        aggregator: &FetchAggregator,
        scope: &FetchScope,
        filters: &FetchFilters,
    ) -> bool {
        let ticket = self.begin_fetch();
        let outcome = aggregator.fetch_transactions(scope, filters).await;
        self.settle(ticket, outcome)
    }

    /// Records passing the filters, newest first
    pub fn filtered(&self) -> Vec<&AnnotatedRecord> {
        let mut filtered: Vec<&AnnotatedRecord> = self
            .records
            .iter()
            .filter(|r| matches(r, &self.filter))
            .collect();
        filtered.sort_by(|a, b| newest_first(a, b));
        filtered
    }

    pub fn projection(&self) -> Projection {
        let filtered = self.filtered();
        let page_size = self.filter.page_size();
        let total_pages = total_pages(filtered.len(), page_size);
        let current_page = self.filter.page().clamp(1, total_pages);
        let page = paginate(&filtered, current_page, page_size);

        let empty_state = if !filtered.is_empty() {
            None
        } else if matches!(self.status, LoadStatus::Failed(_)) {
            Some(EmptyState::LoadFailed)
        } else {
            Some(EmptyState::NoMatchingRecords)
        };

        Projection {
            page_records: page.slice.iter().map(|r| (*r).clone()).collect(),
            total_filtered_count: filtered.len(),
            total_pages: page.total_pages,
            current_page,
            page_size,
            empty_state,
        }
    }

    fn publish_count(&self) {
        let count = self.records.iter().filter(|r| matches(r, &self.filter)).count();
        self.count.send_if_modified(|current| {
            if *current == count {
                false
            } else {
                *current = count;
                true
            }
        });
    }
}

/// `created_at` descending, undated records last, then `id` ascending
fn newest_first(a: &AnnotatedRecord, b: &AnnotatedRecord) -> Ordering {
    match (a.record.created_at, b.record.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.record.id.cmp(&b.record.id))
}
