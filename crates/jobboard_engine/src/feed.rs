use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jobboard_core::{
    Completion, FeedCursor, FeedRequest, FeedSnapshot, FeedView, JobListing, RequestKind,
};
use jobboard_logging::{board_debug, board_info, board_warn};

use crate::{FeedError, FeedSource};

/// Result of [`JobFeed::load_more`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMore {
    /// The wider request finished (or was superseded); current state attached.
    Loaded(FeedSnapshot),
    /// Another load was already running; nothing was requested.
    InFlight(FeedSnapshot),
}

impl LoadMore {
    pub fn snapshot(&self) -> &FeedSnapshot {
        match self {
            LoadMore::Loaded(snapshot) | LoadMore::InFlight(snapshot) => snapshot,
        }
    }
}

/// Paginated listing feed over a [`FeedSource`].
///
/// Methods take `&self` so a UI can hold the feed in an `Arc` and fire
/// "load more" from several places; concurrent load-more calls collapse into
/// one request. The cursor lock is never held across a network await.
pub struct JobFeed {
    source: Arc<dyn FeedSource>,
    cursor: Mutex<FeedCursor>,
}

impl JobFeed {
    pub fn new(source: Arc<dyn FeedSource>, page_size: usize) -> Self {
        Self {
            source,
            cursor: Mutex::new(FeedCursor::new(page_size)),
        }
    }

    /// Fetch the first page, superseding anything in flight.
    pub async fn fetch_initial(&self) -> Result<FeedSnapshot, FeedError> {
        let request = self.lock().begin_initial();
        board_info!("Fetching first {} jobs", request.limit);
        self.run(request).await
    }

    /// Widen the feed by one page. A no-op while another load is running.
    pub async fn load_more(&self) -> Result<LoadMore, FeedError> {
        let request = self.lock().begin_load_more();
        let Some(request) = request else {
            board_debug!("Load more ignored: a load is already in flight");
            return Ok(LoadMore::InFlight(self.snapshot()));
        };
        board_info!("Loading more jobs (total {})", request.limit);
        self.run(request).await.map(LoadMore::Loaded)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }

    /// Render model with each card's saved flag taken from `is_saved`.
    pub fn view(&self, saved_count: usize, is_saved: impl Fn(&str) -> bool) -> FeedView {
        FeedView::build(&self.snapshot(), saved_count, is_saved)
    }

    async fn run(&self, request: FeedRequest) -> Result<FeedSnapshot, FeedError> {
        let guard = PendingRequest {
            cursor: &self.cursor,
            request,
            settled: false,
        };
        let result = self.source.fetch_jobs(request.limit).await;
        guard.settle(result)
    }

    fn lock(&self) -> MutexGuard<'_, FeedCursor> {
        lock_cursor(&self.cursor)
    }
}

fn lock_cursor(cursor: &Mutex<FeedCursor>) -> MutexGuard<'_, FeedCursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the in-flight flag if the caller drops the future mid-request.
struct PendingRequest<'a> {
    cursor: &'a Mutex<FeedCursor>,
    request: FeedRequest,
    settled: bool,
}

impl PendingRequest<'_> {
    fn settle(
        mut self,
        result: Result<Vec<JobListing>, FeedError>,
    ) -> Result<FeedSnapshot, FeedError> {
        self.settled = true;
        let mut cursor = lock_cursor(self.cursor);
        let request = self.request;

        match result {
            Ok(listings) => {
                let received = listings.len();
                match cursor.complete(request, Ok::<_, FeedError>(listings)) {
                    Completion::Stale => {
                        board_debug!("Dropping stale feed result ({} listings)", received)
                    }
                    _ => board_debug!("Feed now holds {} listings", cursor.items().len()),
                }
                Ok(cursor.snapshot())
            }
            Err(err) => match cursor.complete(request, Err::<Vec<_>, _>(&err)) {
                Completion::Stale => {
                    board_debug!("Dropping stale feed error: {}", err);
                    Ok(cursor.snapshot())
                }
                _ => {
                    let what = match request.kind {
                        RequestKind::Initial => "initial fetch",
                        RequestKind::LoadMore => "load more",
                    };
                    board_warn!("Job feed {} failed: {}", what, err);
                    Err(err)
                }
            },
        }
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.settled {
            lock_cursor(self.cursor).abandon(self.request);
        }
    }
}
