use serde::{Deserialize, Serialize};

use crate::{IndexError, InMemorySearchIndex, SearchIndexGateway};

/// Connection settings for the hosted Algolia index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgoliaConfig {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
    /// Per-request HTTP timeout, independent of the service's search timeout.
    pub request_timeout_ms: u64,
}

impl Default for AlgoliaConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            index_name: "users".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl AlgoliaConfig {
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.app_id.trim().is_empty() {
            return Err(IndexError::Config("algolia app_id must not be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(IndexError::Config("algolia api_key must not be empty".into()));
        }
        if self.index_name.trim().is_empty() {
            return Err(IndexError::Config(
                "algolia index_name must not be empty".into(),
            ));
        }
        // Both end up verbatim in the request URL.
        if !self.app_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IndexError::Config(format!(
                "algolia app_id {:?} must be ASCII alphanumeric",
                self.app_id
            )));
        }
        let breaks_path =
            |c: char| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace() || c.is_control();
        if self.index_name.chars().any(breaks_path) {
            return Err(IndexError::Config(format!(
                "algolia index_name {:?} contains characters not allowed in a URL path segment",
                self.index_name
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(IndexError::Config(
                "algolia request_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for selecting and building a search backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
/// assert!(config.build().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// An empty in-process index. Useful for tests and local runs.
    #[default]
    InMemory,
    /// Hosted Algolia index. Requires the `algolia` feature (enabled by default).
    Algolia(AlgoliaConfig),
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn algolia(cfg: AlgoliaConfig) -> Self {
        BackendConfig::Algolia(cfg)
    }

    /// Build the gateway for this configuration.
    pub fn build(&self) -> Result<Box<dyn SearchIndexGateway>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemorySearchIndex::new())),
            BackendConfig::Algolia(cfg) => {
                #[cfg(feature = "algolia")]
                {
                    Ok(Box::new(crate::AlgoliaGateway::new(cfg)?))
                }
                #[cfg(not(feature = "algolia"))]
                {
                    let _ = cfg;
                    Err(IndexError::Config(
                        "algolia backend disabled at compile time".into(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_builds() {
        let gateway = BackendConfig::in_memory().build().unwrap();
        assert_eq!(gateway.backend_name(), "in_memory");
    }

    #[test]
    fn algolia_requires_credentials() {
        let err = BackendConfig::algolia(AlgoliaConfig::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn algolia_rejects_url_breaking_names() {
        let valid = AlgoliaConfig {
            app_id: "APP123".into(),
            api_key: "key".into(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        for name in ["users/../admin", "users?x=1", "users#frag", "my users", "100%"] {
            let cfg = AlgoliaConfig {
                index_name: name.into(),
                ..valid.clone()
            };
            assert!(matches!(cfg.validate(), Err(IndexError::Config(_))), "{name}");
        }
        let cfg = AlgoliaConfig {
            app_id: "evil.example.com/".into(),
            ..valid
        };
        assert!(matches!(cfg.validate(), Err(IndexError::Config(_))));
    }

    #[cfg(feature = "algolia")]
    #[test]
    fn algolia_builds_with_credentials() {
        let cfg = AlgoliaConfig {
            app_id: "APP".into(),
            api_key: "key".into(),
            ..Default::default()
        };
        let gateway = BackendConfig::algolia(cfg).build().unwrap();
        assert_eq!(gateway.backend_name(), "algolia");
    }
}
