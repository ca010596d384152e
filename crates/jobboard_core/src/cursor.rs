use std::collections::HashSet;
use std::fmt;

use crate::JobListing;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Initial,
    LoadMore,
}

/// A fetch the caller must perform: "give me the first `limit` listings".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRequest {
    pub generation: u64,
    pub limit: usize,
    pub kind: RequestKind,
}

/// What `FeedCursor::complete` did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// A newer request was issued after this one; the result was ignored.
    Stale,
}

/// Render-ready copy of the cursor state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedSnapshot {
    pub items: Vec<JobListing>,
    pub requested_count: usize,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

/// Pagination state for a "give me N total" feed.
///
/// Every fetch returns the whole prefix up to `requested_count`, so a
/// successful completion replaces `items` instead of appending to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    page_size: usize,
    requested_count: usize,
    items: Vec<JobListing>,
    loading_initial: bool,
    loading_more: bool,
    last_error: Option<String>,
    generation: u64,
    /// `requested_count` to restore if the pending request fails.
    rollback_count: Option<usize>,
}

impl Default for FeedCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FeedCursor {
    /// A page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            requested_count: page_size,
            items: Vec::new(),
            loading_initial: false,
            loading_more: false,
            last_error: None,
            generation: 0,
            rollback_count: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn items(&self) -> &[JobListing] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading_initial || self.loading_more
    }

    pub fn loading_initial(&self) -> bool {
        self.loading_initial
    }

    pub fn loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new feed session at one page. Supersedes anything in flight.
    pub fn begin_initial(&mut self) -> FeedRequest {
        self.rollback_count.get_or_insert(self.requested_count);
        self.requested_count = self.page_size;
        self.loading_initial = true;
        self.loading_more = false;
        self.issue(RequestKind::Initial)
    }

    /// Widen the request by one page, or `None` while a load is in flight.
    pub fn begin_load_more(&mut self) -> Option<FeedRequest> {
        if self.is_loading() {
            return None;
        }
        self.rollback_count = Some(self.requested_count);
        self.requested_count = self.requested_count.saturating_add(self.page_size);
        self.loading_more = true;
        Some(self.issue(RequestKind::LoadMore))
    }

    /// Apply the outcome of `request`. Only the most recently issued request
    /// may change state, whatever order results arrive in.
    pub fn complete<E: fmt::Display>(
        &mut self,
        request: FeedRequest,
        result: Result<Vec<JobListing>, E>,
    ) -> Completion {
        if request.generation != self.generation {
            return Completion::Stale;
        }
        self.loading_initial = false;
        self.loading_more = false;

        match result {
            Ok(listings) => {
                self.items = dedupe_by_id(listings);
                self.last_error = None;
                self.rollback_count = None;
                Completion::Applied
            }
            Err(err) => {
                if let Some(previous) = self.rollback_count.take() {
                    self.requested_count = previous;
                }
                self.last_error = Some(err.to_string());
                Completion::Failed
            }
        }
    }

    /// Forget a request whose caller went away before it finished.
    pub fn abandon(&mut self, request: FeedRequest) {
        if request.generation != self.generation || !self.is_loading() {
            return;
        }
        self.loading_initial = false;
        self.loading_more = false;
        if let Some(previous) = self.rollback_count.take() {
            self.requested_count = previous;
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            requested_count: self.requested_count,
            loading_initial: self.loading_initial,
            loading_more: self.loading_more,
            error: self.last_error.clone(),
        }
    }

    fn issue(&mut self, kind: RequestKind) -> FeedRequest {
        self.generation += 1;
        FeedRequest {
            generation: self.generation,
            limit: self.requested_count,
            kind,
        }
    }
}

fn dedupe_by_id(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.id.clone()))
        .collect()
}
