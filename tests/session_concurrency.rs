use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use discovery::{
    build_service_with_index, DiscoveryConfig, InMemoryProfileStore, InMemorySearchIndex,
    IndexError, MatchSearchService, Query, RawHit, SearchCriteria, SearchDocument, SearchError,
    SearchIndexGateway, SearchMode, SessionPhase, UserProfile,
};
use tokio::time::{sleep, Instant};

/// Wraps the in-memory index, recording every query and delaying the
/// n-th call by `delays[n]`.
struct ScriptedIndex {
    inner: InMemorySearchIndex,
    delays: Vec<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Option<String>>>,
    completed: AtomicBool,
}

impl ScriptedIndex {
    fn new(delays: Vec<Duration>) -> Self {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let profiles = [
            ("me", "CA", 30),
            ("ana", "CA", 25),
            ("bo", "NY", 41),
            ("cam", "TX", 33),
            ("dot", "CA", 58),
        ];
        let inner = InMemorySearchIndex::with_documents(profiles.iter().map(|(id, state, age)| {
            SearchDocument::from_profile(
                &UserProfile::new(*id, *id).with_state(*state).with_age(*age),
                today,
            )
        }));
        Self {
            inner,
            delays,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
        }
    }

    fn seen_states(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndexGateway for ScriptedIndex {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push(query.state_filter().map(str::to_string));
        if let Some(delay) = self.delays.get(call) {
            sleep(*delay).await;
        }
        let hits = self.inner.query(query).await;
        self.completed.store(true, Ordering::SeqCst);
        hits
    }
}

struct DownIndex;

#[async_trait]
impl SearchIndexGateway for DownIndex {
    async fn query(&self, _query: &Query) -> Result<Vec<RawHit>, IndexError> {
        Err(IndexError::unavailable("connection refused"))
    }
}

struct PanickingIndex;

#[async_trait]
impl SearchIndexGateway for PanickingIndex {
    async fn query(&self, _query: &Query) -> Result<Vec<RawHit>, IndexError> {
        panic!("index client bug");
    }
}

fn service(index: Arc<dyn SearchIndexGateway>) -> Arc<MatchSearchService> {
    build_service_with_index(
        &DiscoveryConfig::default(),
        index,
        Arc::new(InMemoryProfileStore::new()),
    )
    .unwrap()
}

fn in_state(state: &str) -> SearchCriteria {
    SearchCriteria::new("me", SearchMode::Friend).with_state(state)
}

fn states(results: &[discovery::MatchResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.state.clone().unwrap_or_default())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_into_one_query() {
    let index = Arc::new(ScriptedIndex::new(Vec::new()));
    let session = service(index.clone()).session();
    let start = Instant::now();

    session.edit(in_state("NY")).unwrap();
    sleep(Duration::from_millis(50)).await;
    session.edit(in_state("TX")).unwrap();
    sleep(Duration::from_millis(50)).await;
    let last = session.edit(in_state("CA")).unwrap();

    let results = session.wait_for(last).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert_eq!(session.dispatched(), 1);
    assert_eq!(index.seen_states(), vec![Some("CA".to_string())]);
    assert_eq!(states(&results), vec!["CA", "CA"]);
}

#[tokio::test(start_paused = true)]
async fn edits_spaced_beyond_the_window_each_dispatch() {
    let index = Arc::new(ScriptedIndex::new(Vec::new()));
    let session = service(index.clone()).session();

    let first = session.search(in_state("NY")).await.unwrap();
    let second = session.search(in_state("TX")).await.unwrap();
    assert_eq!(states(&first), vec!["NY"]);
    assert_eq!(states(&second), vec!["TX"]);
    assert_eq!(session.dispatched(), 2);
}

#[tokio::test(start_paused = true)]
async fn newer_generation_wins_over_slow_older_query() {
    let index = Arc::new(ScriptedIndex::new(vec![Duration::from_secs(1)]));
    let session = service(index.clone()).session();

    let older = session.edit(in_state("NY")).unwrap();
    sleep(Duration::from_millis(350)).await;
    let querying = session.snapshot();
    assert_eq!(querying.phase, SessionPhase::Querying);
    assert_eq!(querying.generation, 1);

    let newer = session.edit(in_state("CA")).unwrap();
    // Waiting on the superseded edit yields the newer outcome.
    let results = session.wait_for(older).await.unwrap();
    assert_eq!(states(&results), vec!["CA", "CA"]);

    // Long after the first query would have answered, the applied set is unchanged.
    sleep(Duration::from_secs(3)).await;
    let settled = session.snapshot();
    assert_eq!(settled.phase, SessionPhase::Settled);
    assert_eq!(settled.generation, 2);
    assert_eq!(settled.applied_edit, newer);
    assert_eq!(settled.outcome, Some(Ok(results)));
    assert_eq!(session.dispatched(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_aborts_in_flight_query() {
    let index = Arc::new(ScriptedIndex::new(vec![Duration::from_secs(1)]));
    let session = service(index.clone()).session();
    let mut state = session.subscribe();

    session.edit(in_state("CA")).unwrap();
    sleep(Duration::from_millis(350)).await;
    assert_eq!(index.calls.load(Ordering::SeqCst), 1);

    drop(session);
    sleep(Duration::from_secs(5)).await;
    assert!(!index.completed.load(Ordering::SeqCst));
    state.borrow_and_update();
    // The driver is gone, so the state channel is closed.
    assert!(state.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn index_outage_settles_as_failed() {
    let session = service(Arc::new(DownIndex)).session();
    let err = session.search(in_state("CA")).await.unwrap_err();
    assert!(matches!(err, SearchError::SearchUnavailable(_)));
    assert_eq!(session.snapshot().phase, SessionPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_phase_transitions() {
    let index = Arc::new(ScriptedIndex::new(vec![Duration::from_millis(100)]));
    let session = service(index).session();
    let state = session.subscribe();
    assert_eq!(state.borrow().phase, SessionPhase::Idle);

    session.edit(in_state("TX")).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(state.borrow().phase, SessionPhase::Debouncing);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(state.borrow().phase, SessionPhase::Querying);

    sleep(Duration::from_millis(200)).await;
    let settled = state.borrow().clone();
    assert_eq!(settled.phase, SessionPhase::Settled);
    assert_eq!(settled.applied_edit, 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_cycle_still_settles() {
    let session = service(Arc::new(PanickingIndex)).session();

    let err = tokio::time::timeout(Duration::from_secs(60), session.search(in_state("CA")))
        .await
        .expect("session left pending")
        .unwrap_err();
    assert!(matches!(err, SearchError::SearchUnavailable(_)), "{err}");
    assert_eq!(session.snapshot().phase, SessionPhase::Failed);

    // The session keeps serving edits afterwards.
    let again = session.search(in_state("NY")).await.unwrap_err();
    assert!(matches!(again, SearchError::SearchUnavailable(_)));
    assert_eq!(session.dispatched(), 2);
}
