use std::sync::Arc;
use std::time::{Duration, Instant};

use criteria::{AgeRange, CriteriaBuilder, CriteriaError, Query, SearchCriteria};
use index::{RawHit, SearchIndexGateway};
use profile::PrimaryStoreGateway;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::entitlement::resolve_entitlement;
use crate::metrics::{metrics_recorder, SearchOutcome};
use crate::session::SearchSession;
use crate::types::{MatchResult, SearchError};
use crate::EligibilityFilter;


/// Timing knobs for the service and its sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Quiet period after the last edit before a session dispatches.
    pub debounce: Duration,
    pub search_timeout: Duration,
    pub entitlement_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            search_timeout: Duration::from_secs(5),
            entitlement_timeout: Duration::from_secs(3),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.search_timeout.is_zero() {
            return Err(SearchError::InvalidConfig(
                "search_timeout must be greater than zero".into(),
            ));
        }
        if self.entitlement_timeout.is_zero() {
            return Err(SearchError::InvalidConfig(
                "entitlement_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Orchestrates criteria compilation, the index query and eligibility
/// filtering for one search cycle.
///
/// The service itself is stateless between calls. Debounce and stale-response
/// handling live in [`SearchSession`].
pub struct MatchSearchService {
    builder: CriteriaBuilder,
    index: Arc<dyn SearchIndexGateway>,
    store: Arc<dyn PrimaryStoreGateway>,
    filter: EligibilityFilter,
    cfg: ServiceConfig,
}

impl MatchSearchService {
    pub fn new(
        builder: CriteriaBuilder,
        index: Arc<dyn SearchIndexGateway>,
        store: Arc<dyn PrimaryStoreGateway>,
        cfg: ServiceConfig,
    ) -> Result<Self, SearchError> {
        cfg.validate()?;
        Ok(Self {
            builder,
            index,
            store,
            filter: EligibilityFilter::new(),
            cfg,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.cfg
    }

    /// Open a debounced session for one screen.
    pub fn session(self: &Arc<Self>) -> SearchSession {
        SearchSession::new(Arc::clone(self))
    }

    /// Compile criteria, falling back to the widest age range when the
    /// normalized bounds are still contradictory.
    pub fn compile(&self, criteria: &SearchCriteria) -> Result<Query, SearchError> {
        match self.builder.build(criteria) {
            Ok(query) => Ok(query),
            Err(CriteriaError::InvalidCriteria(reason)) => {
                warn!(%reason, "criteria_fallback_widest_range");
                Ok(self
                    .builder
                    .build_with_range(criteria, AgeRange::widest())?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Run one undebounced search cycle.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<MatchResult>, SearchError> {
        let start = Instant::now();
        let query = match self.compile(criteria) {
            Ok(query) => query,
            Err(err) => {
                warn!(error = %err, "search_rejected");
                record(criteria.mode, start, 0, 0, SearchOutcome::Rejected);
                return Err(err);
            }
        };

        let span = info_span!(
            "search_cycle",
            requester = %query.requester_id,
            mode = query.mode.as_str(),
            backend = self.index.backend_name(),
        );
        self.run(query, start).instrument(span).await
    }

    async fn run(&self, query: Query, start: Instant) -> Result<Vec<MatchResult>, SearchError> {
        let (hits, entitlement) = tokio::join!(
            timeout(self.cfg.search_timeout, self.index.query(&query)),
            timeout(
                self.cfg.entitlement_timeout,
                resolve_entitlement(self.store.as_ref(), query.mode)
            ),
        );

        let hits: Vec<RawHit> = match hits {
            Ok(Ok(hits)) => hits,
            Ok(Err(err)) => {
                let err = SearchError::from(err);
                warn!(error = %err, "search_unavailable");
                record(query.mode, start, 0, 0, SearchOutcome::Unavailable);
                return Err(err);
            }
            Err(_) => {
                let err = SearchError::SearchUnavailable(format!(
                    "search timed out after {} ms",
                    self.cfg.search_timeout.as_millis()
                ));
                warn!(error = %err, "search_unavailable");
                record(query.mode, start, 0, 0, SearchOutcome::Unavailable);
                return Err(err);
            }
        };
        let raw_hits = hits.len();

        let entitlement = match entitlement {
            Ok(Ok(entitlement)) => entitlement,
            Ok(Err(err)) => return Ok(self.fail_closed(&query, start, raw_hits, err.into())),
            Err(_) => {
                let err = SearchError::EntitlementCheckFailed(format!(
                    "entitlement read timed out after {} ms",
                    self.cfg.entitlement_timeout.as_millis()
                ));
                return Ok(self.fail_closed(&query, start, raw_hits, err));
            }
        };

        let (results, stats) = self.filter.filter_with_stats(hits, &query, &entitlement);
        debug!(
            received = stats.received,
            malformed = stats.malformed,
            self_matches = stats.self_matches,
            not_entitled = stats.not_entitled,
            out_of_range = stats.out_of_range,
            duplicates = stats.duplicates,
            "eligibility_filtered"
        );
        info!(
            raw_hits,
            kept = results.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "search_completed"
        );
        record(query.mode, start, raw_hits, results.len(), SearchOutcome::Matched);
        Ok(results)
    }

    fn fail_closed(
        &self,
        query: &Query,
        start: Instant,
        raw_hits: usize,
        err: SearchError,
    ) -> Vec<MatchResult> {
        warn!(error = %err, raw_hits, "entitlement_check_failed");
        record(query.mode, start, raw_hits, 0, SearchOutcome::FailedClosed);
        Vec::new()
    }
}

fn record(
    mode: criteria::SearchMode,
    start: Instant,
    raw_hits: usize,
    kept: usize,
    outcome: SearchOutcome,
) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_search(mode, start.elapsed(), raw_hits, kept, outcome);
    }
}
