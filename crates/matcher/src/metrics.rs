// Per-cycle search instrumentation.
//
// One recorder is shared by every service in the process. Install it with
// [`set_search_metrics`]; `None` turns reporting off. Each cycle, including
// rejected and failed ones, reports exactly once.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use criteria::SearchMode;
use once_cell::sync::OnceCell;

/// How a search cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
    Matched,
    /// Entitlements could not be read; an empty list was returned.
    FailedClosed,
    Unavailable,
    Rejected,
}

impl SearchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOutcome::Matched => "matched",
            SearchOutcome::FailedClosed => "failed_closed",
            SearchOutcome::Unavailable => "unavailable",
            SearchOutcome::Rejected => "rejected",
        }
    }
}

/// Metrics observer for search cycles.
pub trait SearchMetrics: Send + Sync {
    /// `raw_hits` is what the index returned, `kept` what survived filtering.
    fn record_search(
        &self,
        mode: SearchMode,
        latency: Duration,
        raw_hits: usize,
        kept: usize,
        outcome: SearchOutcome,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn SearchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn SearchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn SearchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global search metrics recorder.
///
/// Typically called once during startup so every service and session shares
/// the same backend.
pub fn set_search_metrics(recorder: Option<Arc<dyn SearchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
