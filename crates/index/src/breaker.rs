//! Circuit breaker in front of the search service.
//!
//! After `failure_threshold` consecutive transient failures the circuit opens
//! and calls fail fast with [`IndexError::CircuitOpen`]. Once `reset_timeout`
//! has elapsed a single probe is let through (half-open); its outcome closes
//! or re-opens the circuit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use criteria::Query;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{IndexError, RawHit, SearchIndexGateway};

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl BreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.failure_threshold == 0 {
            return Err(IndexError::Config(
                "breaker.failure_threshold must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
    consecutive_failures: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                opened_at: None,
                probe_in_flight: false,
            }),
            consecutive_failures: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check whether a call may go through, moving Open to HalfOpen when due.
    pub fn allow_request(&self) -> bool {
        self.admit().is_some()
    }

    /// Like [`allow_request`](Self::allow_request), also reporting whether the
    /// admitted call holds the single half-open slot.
    fn admit(&self) -> Option<bool> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                let due = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if due {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    Some(true)
                } else {
                    None
                }
            }
            // One probe at a time.
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    None
                } else {
                    inner.probe_in_flight = true;
                    Some(true)
                }
            }
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            info!("search_circuit_closed");
        }
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.probe_in_flight = false;
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let mut inner = self.lock();
        let trip = match inner.state {
            CircuitState::Closed => failures >= u64::from(self.config.failure_threshold),
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if trip {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.probe_in_flight = false;
            warn!(failures, "search_circuit_opened");
        }
    }

    /// Release a half-open probe whose outcome said nothing about health.
    pub fn record_neutral(&self) {
        let mut inner = self.lock();
        inner.probe_in_flight = false;
    }

    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}

/// Frees the half-open slot when the admitted call is dropped before it reports,
/// e.g. by a caller-side timeout or an aborted task.
struct HalfOpenSlot<'a> {
    breaker: &'a CircuitBreaker,
    held: bool,
}

impl HalfOpenSlot<'_> {
    fn disarm(mut self) {
        self.held = false;
    }
}

impl Drop for HalfOpenSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            debug!("search_half_open_call_abandoned");
            self.breaker.record_neutral();
        }
    }
}

/// A gateway wrapped in a [`CircuitBreaker`].
pub struct GuardedGateway<G> {
    inner: G,
    breaker: CircuitBreaker,
}

impl<G: SearchIndexGateway> GuardedGateway<G> {
    pub fn new(inner: G, config: BreakerConfig) -> Self {
        Self {
            inner,
            breaker: CircuitBreaker::new(config),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: SearchIndexGateway> SearchIndexGateway for GuardedGateway<G> {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        let Some(trial) = self.breaker.admit() else {
            warn!(backend = self.inner.backend_name(), "search_circuit_rejected");
            return Err(IndexError::CircuitOpen);
        };
        let slot = HalfOpenSlot {
            breaker: &self.breaker,
            held: trial,
        };
        let result = self.inner.query(query).await;
        slot.disarm();
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(err) if err.is_transient() => self.breaker.record_failure(),
            Err(_) if trial => self.breaker.record_neutral(),
            Err(_) => {}
        }
        result
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
