use thiserror::Error;

/// Errors that can occur while compiling criteria into a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// Age bounds are contradictory after normalization.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),
    /// Self-exclusion cannot be expressed without a requester.
    #[error("criteria require a non-empty requester id")]
    MissingRequester,
    #[error("invalid builder configuration: {0}")]
    InvalidConfig(String),
}
