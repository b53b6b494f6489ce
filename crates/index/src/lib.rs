//! # Candidate Index
//!
//! Read-only access to the search index that backs candidate discovery.
//!
//! The index holds a denormalized [`SearchDocument`] per profile, written by a
//! sync job outside this crate. It is used for candidate generation and
//! ranking only: nothing read from it is trusted for access control.
//!
//! ## Backends
//!
//! All backends implement [`SearchIndexGateway`]:
//!
//! - [`InMemorySearchIndex`]: deterministic in-process index that evaluates
//!   the compiled filters and ranks by term occurrences. Used in tests and
//!   local runs.
//! - `AlgoliaGateway` (feature `algolia`, on by default): posts the compiled
//!   query to the hosted index over HTTPS.
//!
//! Any gateway can be wrapped in a [`GuardedGateway`] so a failing service
//! trips a [`CircuitBreaker`] instead of absorbing a retry storm.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use criteria::{CriteriaBuilder, SearchCriteria, SearchMode};
//! use index::{InMemorySearchIndex, SearchDocument, SearchIndexGateway};
//! use profile::UserProfile;
//!
//! let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let index = InMemorySearchIndex::new();
//! let profile = UserProfile::new("u1", "robin").with_state("CA").with_age(30);
//! index.upsert(SearchDocument::from_profile(&profile, today)).unwrap();
//!
//! let query = CriteriaBuilder::default()
//!     .build(&SearchCriteria::new("me", SearchMode::Friend).with_state("CA"))
//!     .unwrap();
//! let hits = block_on(index.query(&query)).unwrap();
//! assert_eq!(hits[0].object_id, "u1");
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#[cfg(feature = "algolia")]
mod algolia;
mod backend;
mod breaker;
mod document;
mod error;
mod gateway;
mod memory;

#[cfg(feature = "algolia")]
pub use crate::algolia::AlgoliaGateway;
pub use crate::backend::{AlgoliaConfig, BackendConfig};
pub use crate::breaker::{BreakerConfig, CircuitBreaker, CircuitState, GuardedGateway};
pub use crate::document::{RawHit, SearchDocument};
pub use crate::error::IndexError;
pub use crate::gateway::SearchIndexGateway;
pub use crate::memory::InMemorySearchIndex;
