use thiserror::Error;

/// Errors surfaced by search index gateways.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Transport failure, non-success status, or timeout.
    #[error("search service unavailable: {0}")]
    Unavailable(String),
    /// The circuit breaker is open; the call was not attempted.
    #[error("search service circuit open")]
    CircuitOpen,
    #[error("search response decode error: {0}")]
    Decode(String),
    #[error("invalid index configuration: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// Whether the failure says something about the health of the service.
    ///
    /// Only these count toward opening the circuit.
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexError::Unavailable(_) | IndexError::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(IndexError::unavailable("timeout").is_transient());
        assert!(IndexError::backend("poisoned lock").is_transient());
        assert!(!IndexError::CircuitOpen.is_transient());
        assert!(!IndexError::Config("x".into()).is_transient());
    }

    #[test]
    fn display_carries_detail() {
        let err = IndexError::unavailable("HTTP error 503");
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("503"));
    }
}
