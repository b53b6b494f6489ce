//! YAML configuration for candidate discovery.
//!
//! Every section and field has a default, so an empty document (apart from
//! `version`) is a valid in-memory configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! criteria:
//!   hits_per_page: 50
//!   advisory_tier_facet: true
//!
//! session:
//!   debounce_ms: 300
//!   search_timeout_ms: 5000
//!   entitlement_timeout_ms: 3000
//!
//! index:
//!   backend: "algolia"
//!   app_id: "ABCDEF1234"
//!   api_key_env: "ALGOLIA_SEARCH_KEY"
//!   index_name: "users"
//!   request_timeout_ms: 4000
//!   breaker:
//!     failure_threshold: 5
//!     reset_timeout_ms: 30000
//!
//! logging:
//!   level: "info"
//!   json: true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use criteria::{BuilderConfig, MAX_HITS_PER_PAGE};
use index::{AlgoliaConfig, BackendConfig, BreakerConfig};
use matcher::ServiceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

/// Top-level configuration for the discovery subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiscoveryConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub criteria: CriteriaYamlConfig,

    #[serde(default)]
    pub session: SessionYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DiscoveryConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DiscoveryConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.criteria.validate()?;
        self.session.validate()?;
        self.index.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            criteria: CriteriaYamlConfig::default(),
            session: SessionYamlConfig::default(),
            index: IndexYamlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Criteria builder YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaYamlConfig {
    #[serde(default = "default_hits_per_page")]
    pub hits_per_page: usize,

    #[serde(default = "true_value")]
    pub advisory_tier_facet: bool,
}

impl CriteriaYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.hits_per_page == 0 || self.hits_per_page > MAX_HITS_PER_PAGE {
            return Err(ConfigLoadError::Validation(format!(
                "criteria.hits_per_page must be between 1 and {MAX_HITS_PER_PAGE}"
            )));
        }
        Ok(())
    }

    pub fn to_builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            hits_per_page: self.hits_per_page,
            advisory_tier_facet: self.advisory_tier_facet,
        }
    }
}

impl Default for CriteriaYamlConfig {
    fn default() -> Self {
        Self {
            hits_per_page: default_hits_per_page(),
            advisory_tier_facet: true,
        }
    }
}

/// Session timing YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionYamlConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    #[serde(default = "default_entitlement_timeout_ms")]
    pub entitlement_timeout_ms: u64,
}

impl SessionYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.search_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "session.search_timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.entitlement_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "session.entitlement_timeout_ms must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            search_timeout: Duration::from_millis(self.search_timeout_ms),
            entitlement_timeout: Duration::from_millis(self.entitlement_timeout_ms),
        }
    }
}

impl Default for SessionYamlConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            entitlement_timeout_ms: default_entitlement_timeout_ms(),
        }
    }
}

/// Circuit breaker YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerYamlConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

impl BreakerYamlConfig {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        BreakerConfig::default()
            .with_failure_threshold(self.failure_threshold)
            .with_reset_timeout(Duration::from_millis(self.reset_timeout_ms))
    }
}

impl Default for BreakerYamlConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub app_id: Option<String>,

    /// Inline key. Prefer `api_key_env` outside local setups.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the search key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub breaker: BreakerYamlConfig,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "algolia"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "algolia" {
            if self.app_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
                return Err(ConfigLoadError::MissingField("index.app_id".to_string()));
            }
            if self.api_key.is_none() && self.api_key_env.is_none() {
                return Err(ConfigLoadError::MissingField(
                    "index.api_key or index.api_key_env".to_string(),
                ));
            }
            if self.index_name.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "index.index_name must not be empty".to_string(),
                ));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "index.request_timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigLoadError::Validation(
                "index.breaker.failure_threshold must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the backend, reading the API key from the environment if needed.
    pub fn to_backend_config(&self) -> Result<BackendConfig, ConfigLoadError> {
        if self.backend != "algolia" {
            return Ok(BackendConfig::in_memory());
        }
        let app_id = self
            .app_id
            .clone()
            .ok_or_else(|| ConfigLoadError::MissingField("index.app_id".to_string()))?;
        let api_key = match (&self.api_key, &self.api_key_env) {
            (Some(key), _) => key.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                ConfigLoadError::MissingField(format!("environment variable {var}"))
            })?,
            (None, None) => {
                return Err(ConfigLoadError::MissingField(
                    "index.api_key or index.api_key_env".to_string(),
                ))
            }
        };
        Ok(BackendConfig::algolia(AlgoliaConfig {
            app_id,
            api_key,
            index_name: self.index_name.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }))
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            app_id: None,
            api_key: None,
            api_key_env: None,
            index_name: default_index_name(),
            request_timeout_ms: default_request_timeout_ms(),
            breaker: BreakerYamlConfig::default(),
        }
    }
}

/// Logging YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `matcher=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Helper functions for serde defaults
fn true_value() -> bool {
    true
}
fn default_hits_per_page() -> usize {
    MAX_HITS_PER_PAGE
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_search_timeout_ms() -> u64 {
    5_000
}
fn default_entitlement_timeout_ms() -> u64 {
    3_000
}
fn default_backend() -> String {
    "in_memory".to_string()
}
fn default_index_name() -> String {
    "users".to_string()
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_reset_timeout_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = DiscoveryConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(config, DiscoveryConfig::default());
        assert_eq!(
            config.session.to_service_config(),
            ServiceConfig::default()
        );
        assert_eq!(
            config.criteria.to_builder_config(),
            BuilderConfig::default()
        );
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1.0"
name: "staging"
session:
  debounce_ms: 150
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = DiscoveryConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("staging"));
        assert_eq!(
            config.session.to_service_config().debounce,
            Duration::from_millis(150)
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = DiscoveryConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let err = DiscoveryConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_hits_per_page_bounds() {
        let yaml = r#"
version: "1.0"
criteria:
  hits_per_page: 51
"#;
        let err = DiscoveryConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("hits_per_page"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let yaml = r#"
version: "1.0"
index:
  backend: "elasticsearch"
"#;
        let err = DiscoveryConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("index.backend"));
    }

    #[test]
    fn test_algolia_requires_credentials() {
        let yaml = r#"
version: "1.0"
index:
  backend: "algolia"
  app_id: "APP"
"#;
        let err = DiscoveryConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingField(_)));
    }

    #[test]
    fn test_algolia_backend_resolution() {
        let yaml = r#"
version: "1.0"
index:
  backend: "algolia"
  app_id: "APP"
  api_key: "secret"
  index_name: "profiles"
  request_timeout_ms: 2500
  breaker:
    failure_threshold: 2
    reset_timeout_ms: 1000
"#;
        let config = DiscoveryConfig::from_yaml(yaml).unwrap();
        let backend = config.index.to_backend_config().unwrap();
        assert_eq!(
            backend,
            BackendConfig::algolia(AlgoliaConfig {
                app_id: "APP".into(),
                api_key: "secret".into(),
                index_name: "profiles".into(),
                request_timeout_ms: 2500,
            })
        );
        let breaker = config.index.breaker.to_breaker_config();
        assert_eq!(breaker.failure_threshold, 2);
        assert_eq!(breaker.reset_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_api_key_env_must_exist() {
        let index = IndexYamlConfig {
            backend: "algolia".into(),
            app_id: Some("APP".into()),
            api_key_env: Some("DISCOVERY_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..IndexYamlConfig::default()
        };
        let err = index.to_backend_config().unwrap_err();
        assert!(err.to_string().contains("DISCOVERY_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = r#"
version: "1.0"
session:
  search_timeout_ms: 0
"#;
        assert!(DiscoveryConfig::from_yaml(yaml).is_err());
    }
}
