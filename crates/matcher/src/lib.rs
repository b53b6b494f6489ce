//! # Candidate Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the criteria layer (`criteria`), the search index
//! (`index`) and the primary profile store (`profile`). It turns what a user
//! entered on the "Find a Friend" / "Find a Date" screens into an ordered list
//! of candidates they are allowed to see.
//!
//! One search cycle is:
//!
//! 1. compile [`SearchCriteria`](criteria::SearchCriteria) into a
//!    [`Query`](criteria::Query),
//! 2. run the query against the index while the dating allow-set is read from
//!    the primary store,
//! 3. re-validate the raw hits with [`EligibilityFilter`].
//!
//! The index narrows and ranks; the primary store decides who is visible.
//!
//! ## Core Types
//!
//! - [`MatchSearchService`]: one undebounced cycle, with timeouts on both
//!   remote reads.
//! - [`SearchSession`]: per-screen handle that debounces edits and discards
//!   stale responses via a [`GenerationGate`].
//! - [`EligibilityFilter`] / [`Entitlement`]: self-exclusion, dating
//!   entitlement, age re-check, dedup.
//! - [`MatchResult`] / [`SearchError`].
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use criteria::{CriteriaBuilder, SearchCriteria, SearchMode};
//! use index::InMemorySearchIndex;
//! use matcher::{MatchSearchService, ServiceConfig};
//! use profile::InMemoryProfileStore;
//!
//! # async fn run() -> Result<(), matcher::SearchError> {
//! let service = Arc::new(MatchSearchService::new(
//!     CriteriaBuilder::default(),
//!     Arc::new(InMemorySearchIndex::new()),
//!     Arc::new(InMemoryProfileStore::new()),
//!     ServiceConfig::default(),
//! )?);
//!
//! let session = service.session();
//! let results = session
//!     .search(SearchCriteria::new("me", SearchMode::Dating).with_state("CA"))
//!     .await?;
//! for hit in results {
//!     println!("{} {}", hit.rank, hit.username);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`SearchMetrics`] implementation via [`set_search_metrics`] to
//! record per-cycle latency, hit counts and outcome.

mod entitlement;
mod filter;
pub mod engine;
pub mod metrics;
pub mod session;
pub mod types;

pub use crate::engine::{MatchSearchService, ServiceConfig};
pub use crate::entitlement::{resolve_entitlement, Entitlement};
pub use crate::filter::{EligibilityFilter, FilterStats};
pub use crate::metrics::{set_search_metrics, SearchMetrics, SearchOutcome};
pub use crate::session::{GenerationGate, SearchSession, SessionPhase, SessionState};
pub use crate::types::{MatchResult, SearchError};
