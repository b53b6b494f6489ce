//! Candidate discovery for the "Find a Friend" / "Find a Date" screens.
//!
//! This crate stitches the workspace together: it re-exports the public types
//! of `profile`, `criteria`, `index` and `matcher`, loads the YAML
//! [`DiscoveryConfig`], and wires a ready-to-use [`MatchSearchService`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use discovery::{build_service, init_tracing, DiscoveryConfig, InMemoryProfileStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = DiscoveryConfig::from_file("discovery.yaml")?;
//! init_tracing(&cfg.logging);
//! let service = build_service(&cfg, Arc::new(InMemoryProfileStore::new()))?;
//! let _session = service.session();
//! # Ok(())
//! # }
//! ```

pub mod config;
mod logging;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use crate::config::{ConfigLoadError, DiscoveryConfig, LoggingConfig};
pub use crate::logging::init_tracing;

pub use criteria::{
    normalize_age, AgeInput, AgeRange, BuilderConfig, CriteriaBuilder, CriteriaError,
    ExactFilter, NumericFilter, Query, SearchCriteria, SearchMode,
};
#[cfg(feature = "algolia")]
pub use index::AlgoliaGateway;
pub use index::{
    AlgoliaConfig, BackendConfig, BreakerConfig, CircuitBreaker, GuardedGateway,
    InMemorySearchIndex, IndexError, RawHit, SearchDocument, SearchIndexGateway,
};
pub use matcher::{
    resolve_entitlement, set_search_metrics, EligibilityFilter, Entitlement, FilterStats,
    GenerationGate, MatchResult, MatchSearchService, SearchError, SearchMetrics, SearchOutcome,
    SearchSession, ServiceConfig, SessionPhase, SessionState,
};
pub use profile::{
    Answer, InMemoryProfileStore, PrimaryStoreGateway, StoreError, SubscriptionTier, UserId,
    UserProfile,
};

/// Errors raised while wiring a service from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Build a service whose index backend comes from `cfg.index`.
pub fn build_service(
    cfg: &DiscoveryConfig,
    store: Arc<dyn PrimaryStoreGateway>,
) -> Result<Arc<MatchSearchService>, BuildError> {
    let gateway = cfg.index.to_backend_config()?.build()?;
    build_service_with_index(cfg, Arc::from(gateway), store)
}

/// Build a service over an existing index gateway.
///
/// The gateway is wrapped in a circuit breaker configured by `cfg.index.breaker`.
pub fn build_service_with_index(
    cfg: &DiscoveryConfig,
    index: Arc<dyn SearchIndexGateway>,
    store: Arc<dyn PrimaryStoreGateway>,
) -> Result<Arc<MatchSearchService>, BuildError> {
    cfg.validate()?;
    let builder = CriteriaBuilder::new(cfg.criteria.to_builder_config())?;
    let backend = index.backend_name();
    let guarded = GuardedGateway::new(index, cfg.index.breaker.to_breaker_config());
    let service = MatchSearchService::new(
        builder,
        Arc::new(guarded),
        store,
        cfg.session.to_service_config(),
    )?;
    info!(
        backend,
        debounce_ms = cfg.session.debounce_ms,
        hits_per_page = cfg.criteria.hits_per_page,
        "discovery_service_built"
    );
    Ok(Arc::new(service))
}
