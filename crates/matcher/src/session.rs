//! Debounced, cancellable search sessions.
//!
//! A [`SearchSession`] belongs to one screen. Edits go to a driver task that
//! owns the debounce timer, the [`GenerationGate`] and the in-flight query:
//!
//! ```text
//! Idle -> Debouncing -> Querying -> (Settled | Failed)
//!            ^  |          |
//!            +--+----------+   any edit
//! ```
//!
//! Rapid edits collapse into one query built from the last criteria. An edit
//! during `Querying` aborts the in-flight task and invalidates its generation,
//! so a late response can never overwrite newer results. The driver awaits
//! the in-flight task itself, so a cycle that panics settles as `Failed`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use criteria::SearchCriteria;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::{MatchResult, MatchSearchService, SearchError};

/// Monotonic generation counter with a single accepted slot.
///
/// `begin` tags a dispatch, `invalidate` revokes it, and `accept` admits a
/// response only if it carries the currently accepted tag. Each tag is
/// accepted at most once.
#[derive(Debug, Default, Clone)]
pub struct GenerationGate {
    current: u64,
    accepted: Option<u64>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.accepted = Some(self.current);
        self.current
    }

    pub fn invalidate(&mut self) {
        self.accepted = None;
    }

    pub fn accept(&mut self, generation: u64) -> bool {
        if self.accepted == Some(generation) {
            self.accepted = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Debouncing,
    Querying,
    Settled,
    Failed,
}

impl SessionPhase {
    /// True once the latest dispatch has produced an outcome.
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionPhase::Settled | SessionPhase::Failed)
    }
}

/// What the UI observes about a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Generation of the most recent dispatch.
    pub generation: u64,
    /// Edit whose criteria produced `outcome`.
    pub applied_edit: u64,
    pub outcome: Option<Result<Vec<MatchResult>, SearchError>>,
}

type Outcome = Result<Vec<MatchResult>, SearchError>;

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Edit {
    seq: u64,
    criteria: SearchCriteria,
}

struct InFlight {
    generation: u64,
    edit: u64,
    task: AbortOnDrop<Outcome>,
}

/// Handle to one screen's search session.
///
/// Dropping the handle stops the driver and aborts any in-flight query.
/// Must be created inside a tokio runtime.
pub struct SearchSession {
    edits: mpsc::UnboundedSender<Edit>,
    state: watch::Receiver<SessionState>,
    next_edit: Mutex<u64>,
    dispatched: Arc<AtomicU64>,
    _driver: AbortOnDrop<()>,
}

impl SearchSession {
    pub fn new(service: Arc<MatchSearchService>) -> Self {
        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let dispatched = Arc::new(AtomicU64::new(0));

        let driver = Driver {
            debounce: service.config().debounce,
            service,
            edits: edit_rx,
            state: state_tx,
            gate: GenerationGate::new(),
            dispatched: Arc::clone(&dispatched),
        };
        let handle = tokio::spawn(driver.run());

        Self {
            edits: edit_tx,
            state: state_rx,
            next_edit: Mutex::new(0),
            dispatched,
            _driver: AbortOnDrop(handle),
        }
    }

    /// Submit new criteria without waiting. Returns the edit's sequence number.
    pub fn edit(&self, criteria: SearchCriteria) -> Result<u64, SearchError> {
        // Held across the send so channel order matches sequence order.
        let mut next = self
            .next_edit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let seq = *next + 1;
        self.edits
            .send(Edit { seq, criteria })
            .map_err(|_| SearchError::SessionClosed)?;
        *next = seq;
        Ok(seq)
    }

    /// Wait for the outcome of `edit`, or of a later edit that superseded it.
    pub async fn wait_for(&self, edit: u64) -> Result<Vec<MatchResult>, SearchError> {
        let mut rx = self.state.clone();
        let outcome = rx
            .wait_for(|s| s.applied_edit >= edit && s.phase.is_settled())
            .await
            .map_err(|_| SearchError::SessionClosed)?
            .outcome
            .clone();
        outcome.unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Submit criteria and wait until they (or newer ones) settle.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<Vec<MatchResult>, SearchError> {
        let seq = self.edit(criteria)?;
        self.wait_for(seq).await
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Number of queries dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }
}

struct Driver {
    service: Arc<MatchSearchService>,
    debounce: Duration,
    edits: mpsc::UnboundedReceiver<Edit>,
    state: watch::Sender<SessionState>,
    gate: GenerationGate,
    dispatched: Arc<AtomicU64>,
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn join_in_flight(in_flight: &mut Option<InFlight>) -> Result<Outcome, JoinError> {
    match in_flight {
        Some(flight) => (&mut flight.task.0).await,
        None => std::future::pending().await,
    }
}

impl Driver {
    async fn run(mut self) {
        let mut pending: Option<Edit> = None;
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                edit = self.edits.recv() => {
                    let Some(edit) = edit else { break };
                    if let Some(stale) = in_flight.take() {
                        self.gate.invalidate();
                        debug!(generation = stale.generation, "search_superseded");
                    }
                    debug!(edit = edit.seq, "criteria_edited");
                    pending = Some(edit);
                    deadline = Some(Instant::now() + self.debounce);
                    self.state.send_modify(|s| s.phase = SessionPhase::Debouncing);
                }
                _ = sleep_until_some(deadline) => {
                    deadline = None;
                    if let Some(edit) = pending.take() {
                        in_flight = Some(self.dispatch(edit));
                    }
                }
                joined = join_in_flight(&mut in_flight) => {
                    let Some(flight) = in_flight.take() else { continue };
                    let outcome = joined.unwrap_or_else(|err| {
                        warn!(generation = flight.generation, error = %err, "search_task_failed");
                        Err(SearchError::SearchUnavailable(format!("search task failed: {err}")))
                    });
                    if self.gate.accept(flight.generation) {
                        self.settle(flight.generation, flight.edit, outcome);
                    } else {
                        debug!(generation = flight.generation, "stale_response_discarded");
                    }
                }
            }
        }
        drop(in_flight);
        debug!("search_session_closed");
    }

    fn dispatch(&mut self, edit: Edit) -> InFlight {
        let generation = self.gate.begin();
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.phase = SessionPhase::Querying;
            s.generation = generation;
        });
        info!(generation, edit = edit.seq, "search_dispatched");

        let service = Arc::clone(&self.service);
        let criteria = edit.criteria;
        let task = tokio::spawn(async move { service.search(&criteria).await });
        InFlight {
            generation,
            edit: edit.seq,
            task: AbortOnDrop(task),
        }
    }

    fn settle(&mut self, generation: u64, edit: u64, outcome: Outcome) {
        let phase = if outcome.is_ok() {
            SessionPhase::Settled
        } else {
            SessionPhase::Failed
        };
        match &outcome {
            Ok(results) => info!(generation, edit, results = results.len(), "search_settled"),
            Err(err) => info!(generation, edit, error = %err, "search_failed"),
        }
        self.state.send_modify(|s| {
            s.phase = phase;
            s.applied_edit = edit;
            s.outcome = Some(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_accepts_only_current_generation_once() {
        let mut gate = GenerationGate::new();
        let first = gate.begin();
        let second = gate.begin();
        assert!(second > first);
        assert!(!gate.accept(first));
        assert!(gate.accept(second));
        assert!(!gate.accept(second));
    }

    #[test]
    fn invalidated_generation_is_rejected() {
        let mut gate = GenerationGate::new();
        let token = gate.begin();
        gate.invalidate();
        assert_eq!(gate.in_flight(), None);
        assert!(!gate.accept(token));
        assert_eq!(gate.current(), token);
    }

    #[test]
    fn late_response_after_newer_dispatch_is_discarded() {
        let mut gate = GenerationGate::new();
        let g1 = gate.begin();
        gate.invalidate();
        let g2 = gate.begin();
        // g2 answers first, then g1 straggles in.
        assert!(gate.accept(g2));
        assert!(!gate.accept(g1));
    }

    #[test]
    fn settled_phases() {
        assert!(SessionPhase::Settled.is_settled());
        assert!(SessionPhase::Failed.is_settled());
        assert!(!SessionPhase::Querying.is_settled());
        assert!(!SessionPhase::Idle.is_settled());
    }
}
