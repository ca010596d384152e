use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use jobboard_core::JobListing;
use jobboard_engine::{
    FailureKind, FeedError, FeedSettings, FeedSource, JobFeed, LoadMore, ReqwestFeedSource,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Semaphore;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobboard_logging::initialize_for_tests);
}

fn listings(count: usize) -> Vec<JobListing> {
    (1..=count)
        .map(|n| JobListing::new(n.to_string(), format!("Job {n}"), format!("https://jobs.example.com/{n}")))
        .collect()
}

fn ids(items: &[JobListing]) -> Vec<String> {
    items.iter().map(|l| l.id.clone()).collect()
}

/// In-process "first N listings" source with optional gating and failure injection.
struct ScriptedSource {
    available: usize,
    limits: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
    fail_next: AtomicBool,
}

impl ScriptedSource {
    fn new(available: usize) -> Self {
        Self {
            available,
            limits: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Every request blocks until `release` is called.
    fn gated(available: usize) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(available)
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch_jobs(&self, limit: usize) -> Result<Vec<JobListing>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(limit);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FeedError {
                kind: FailureKind::Network,
                message: "connection reset".to_string(),
            });
        }
        Ok(listings(limit.min(self.available)))
    }
}

async fn wait_for_calls(source: &ScriptedSource, calls: usize) {
    while source.calls() < calls {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn first_page_then_load_more_to_forty() {
    init_logging();
    let source = Arc::new(ScriptedSource::new(100));
    let feed = JobFeed::new(source.clone(), 20);

    let first = feed.fetch_initial().await.unwrap();
    assert_eq!(first.items.len(), 20);
    assert_eq!(first.requested_count, 20);

    let more = feed.load_more().await.unwrap();
    let LoadMore::Loaded(snapshot) = more else {
        panic!("expected a completed load");
    };
    assert_eq!(snapshot.items.len(), 40);
    assert_eq!(snapshot.requested_count, 40);
    assert_eq!(source.limits(), vec![20, 40]);
}

#[tokio::test]
async fn short_feed_returns_what_is_available() {
    init_logging();
    let source = Arc::new(ScriptedSource::new(25));
    let feed = JobFeed::new(source, 20);

    assert_eq!(feed.fetch_initial().await.unwrap().items.len(), 20);
    let more = feed.load_more().await.unwrap();
    assert_eq!(more.snapshot().items.len(), 25);
}

#[tokio::test]
async fn load_more_keeps_earlier_items_as_prefix() {
    init_logging();
    let source = Arc::new(ScriptedSource::new(100));
    let feed = JobFeed::new(source, 10);

    let before = ids(&feed.fetch_initial().await.unwrap().items);
    let after = ids(&feed.load_more().await.unwrap().snapshot().items);

    assert!(after.len() >= before.len());
    assert_eq!(&after[..before.len()], &before[..]);
}

#[tokio::test]
async fn concurrent_load_more_sends_one_request() {
    init_logging();
    let source = Arc::new(ScriptedSource::gated(100));
    let feed = Arc::new(JobFeed::new(source.clone(), 20));

    source.release();
    feed.fetch_initial().await.unwrap();

    let background = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.load_more().await })
    };
    wait_for_calls(&source, 2).await;

    let second = feed.load_more().await.unwrap();
    assert!(matches!(second, LoadMore::InFlight(_)));
    assert!(second.snapshot().loading_more);
    assert_eq!(second.snapshot().requested_count, 40);

    source.release();
    let first = background.await.unwrap().unwrap();
    assert!(matches!(first, LoadMore::Loaded(_)));

    assert_eq!(source.calls(), 2);
    assert_eq!(source.limits(), vec![20, 40]);
    assert_eq!(feed.snapshot().requested_count, 40);
    assert_eq!(feed.snapshot().items.len(), 40);
}

#[tokio::test]
async fn failed_load_more_rolls_back_and_retry_requests_same_total() {
    init_logging();
    let source = Arc::new(ScriptedSource::new(100));
    let feed = JobFeed::new(source.clone(), 20);
    feed.fetch_initial().await.unwrap();

    source.fail_next();
    let err = feed.load_more().await.unwrap_err();
    assert!(err.is_network());

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.requested_count, 20);
    assert_eq!(snapshot.items.len(), 20);
    assert!(snapshot.error.is_some());
    assert!(!snapshot.loading_more);

    feed.load_more().await.unwrap();
    assert_eq!(source.limits(), vec![20, 40, 40]);
    assert_eq!(feed.snapshot().error, None);
}

#[tokio::test]
async fn failed_initial_fetch_surfaces_error_with_no_items() {
    init_logging();
    let source = Arc::new(ScriptedSource::new(100));
    let feed = JobFeed::new(source.clone(), 20);

    source.fail_next();
    let err = feed.fetch_initial().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);

    let snapshot = feed.snapshot();
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.loading_initial);
    assert!(snapshot.error.unwrap().contains("connection reset"));
    // No automatic retry.
    assert_eq!(source.calls(), 1);
}

/// First call is slow and returns a single "old" listing; later calls are fast.
struct RacingSource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl FeedSource for RacingSource {
    async fn fetch_jobs(&self, limit: usize) -> Result<Vec<JobListing>, FeedError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            return Ok(vec![JobListing::new("old", "Old", "https://old.example.com")]);
        }
        Ok(listings(limit))
    }
}

#[tokio::test]
async fn latest_initial_fetch_wins_over_slower_older_one() {
    init_logging();
    let feed = JobFeed::new(Arc::new(RacingSource { calls: AtomicUsize::new(0) }), 3);

    let (older, newer) = tokio::join!(feed.fetch_initial(), feed.fetch_initial());

    assert_eq!(ids(&newer.unwrap().items), vec!["1", "2", "3"]);
    // The older call completes last but reports the current state.
    assert_eq!(ids(&older.unwrap().items), vec!["1", "2", "3"]);
    assert_eq!(ids(&feed.snapshot().items), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn dropped_load_more_releases_the_in_flight_flag() {
    init_logging();
    let source = Arc::new(ScriptedSource::gated(100));
    let feed = JobFeed::new(source.clone(), 20);
    source.release();
    feed.fetch_initial().await.unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), feed.load_more()).await;
    assert!(timed_out.is_err());

    let snapshot = feed.snapshot();
    assert!(!snapshot.loading_more);
    assert_eq!(snapshot.requested_count, 20);
}

#[tokio::test]
async fn view_marks_saved_listings() {
    init_logging();
    let feed = JobFeed::new(Arc::new(ScriptedSource::new(3)), 20);
    feed.fetch_initial().await.unwrap();

    let view = feed.view(1, |id| id == "2");
    let saved: Vec<_> = view.cards.iter().map(|card| card.saved).collect();
    assert_eq!(saved, vec![false, true, false]);
    assert_eq!(view.saved_count, 1);
}

/// Serves `min(limit, available)` jobs, like the real endpoint.
struct LimitResponder {
    available: usize,
}

impl Respond for LimitResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let limit = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "limit")
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let jobs: Vec<_> = (1..=limit.min(self.available))
            .map(|n| json!({ "id": n, "title": format!("Job {n}"), "url": format!("https://jobs.example.com/{n}") }))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "jobs": jobs }))
    }
}

#[tokio::test]
async fn paginates_against_http_endpoint() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("GET"))
        .respond_with(LimitResponder { available: 45 })
        .mount(&server)
        .await;

    let settings = FeedSettings {
        base_url: format!("{}/api/remote-jobs", server.uri()),
        ..FeedSettings::default()
    };
    let page_size = settings.page_size;
    let source = ReqwestFeedSource::new(settings).unwrap();
    let feed = JobFeed::new(Arc::new(source), page_size);

    assert_eq!(feed.fetch_initial().await.unwrap().items.len(), 20);
    assert_eq!(feed.load_more().await.unwrap().snapshot().items.len(), 40);
    assert_eq!(feed.load_more().await.unwrap().snapshot().items.len(), 45);
    assert_eq!(feed.snapshot().requested_count, 60);
}
