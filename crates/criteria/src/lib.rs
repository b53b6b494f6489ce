//! Criteria layer for candidate discovery.
//!
//! Turns what a user typed and tapped on the "Find a Friend" / "Find a Date"
//! screens into a [`Query`] the search service understands.
//!
//! ## What we do
//!
//! - Age bounds: parse stepper text, default missing or non-numeric values,
//!   clamp into `18 ≤ min < max ≤ 99`.
//! - Self-exclusion: every query carries `NOT objectID:<requester>`, in every mode.
//! - Facets: optional exact `state` filter, advisory `subscriptionType` facet
//!   in dating mode.
//! - Relevance text: free text followed by the selected tag words.
//!
//! ## Pure function guarantee
//!
//! [`CriteriaBuilder::build`] does no I/O. Same criteria + same config gives
//! the same query, which is what makes repeated searches idempotent.
//!
//! The advisory tier facet only narrows candidates. Entitlement is decided
//! later against the primary store, never from the index.

mod age;
mod builder;
mod error;
mod query;
mod types;

pub use crate::age::{normalize_age, AgeRange, MAX_AGE, MIN_AGE};
pub use crate::builder::{BuilderConfig, CriteriaBuilder, MAX_HITS_PER_PAGE};
pub use crate::error::CriteriaError;
pub use crate::query::{ExactFilter, NumericFilter, Query, AGE_ATTRIBUTE};
pub use crate::types::{AgeInput, SearchCriteria, SearchMode};
