use thiserror::Error;

use crate::UserId;

/// Errors surfaced by a [`PrimaryStoreGateway`](crate::PrimaryStoreGateway).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No profile exists for the requested id.
    #[error("profile not found: {0}")]
    NotFound(UserId),
    /// The store could not be reached or refused the read.
    #[error("primary store unavailable: {0}")]
    Unavailable(String),
    /// Local backend failure (poisoned lock, corrupt row).
    #[error("primary store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        Self::Unavailable(err.to_string())
    }
}
