use criteria::CriteriaError;
use index::IndexError;
use profile::{StoreError, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One candidate shown to the requester.
///
/// Recomputed for every query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub user_id: UserId,
    pub username: String,
    pub state: Option<String>,
    pub age: Option<i64>,
    pub profile_picture: Option<String>,
    /// 1-based position in the filtered list.
    pub rank: usize,
}

/// Errors produced by the discovery layer.
///
/// Every search settles with either a (possibly empty) result list or one of
/// these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Criteria could not be compiled even with the widest age range.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),
    /// Transport or service failure, or timeout, on the search call.
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),
    /// The primary store could not confirm entitlements.
    #[error("entitlement check failed: {0}")]
    EntitlementCheckFailed(String),
    /// The session driver is gone.
    #[error("search session closed")]
    SessionClosed,
    #[error("invalid service config: {0}")]
    InvalidConfig(String),
}

impl From<CriteriaError> for SearchError {
    fn from(err: CriteriaError) -> Self {
        match err {
            CriteriaError::InvalidConfig(msg) => SearchError::InvalidConfig(msg),
            other => SearchError::InvalidCriteria(other.to_string()),
        }
    }
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        SearchError::SearchUnavailable(err.to_string())
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        SearchError::EntitlementCheckFailed(err.to_string())
    }
}
