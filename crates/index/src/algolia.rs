use std::time::Duration;

use async_trait::async_trait;
use criteria::Query;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{AlgoliaConfig, IndexError, RawHit, SearchIndexGateway};

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Gateway onto a hosted Algolia index.
pub struct AlgoliaGateway {
    client: reqwest::Client,
    url: String,
    app_id: String,
    api_key: String,
}

impl AlgoliaGateway {
    pub fn new(cfg: &AlgoliaConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .connect_timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| IndexError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: query_url(&cfg.app_id, &cfg.index_name),
            app_id: cfg.app_id.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub(crate) fn query_url(app_id: &str, index_name: &str) -> String {
    format!("https://{app_id}-dsn.algolia.net/1/indexes/{index_name}/query")
}

pub(crate) fn request_body(query: &Query) -> Value {
    json!({
        "query": query.text,
        "filters": query.filter_expression(),
        "numericFilters": query.numeric_expressions(),
        "hitsPerPage": query.hits_per_page,
        "attributesToRetrieve": query.attributes_to_retrieve,
    })
}

#[async_trait]
impl SearchIndexGateway for AlgoliaGateway {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        let response = self
            .client
            .post(&self.url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(&request_body(query))
            .send()
            .await
            .map_err(|e| IndexError::unavailable(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "algolia_query_failed");
            return Err(IndexError::unavailable(format!("HTTP error {status}: {body}")));
        }

        let decoded = response
            .json::<QueryResponse>()
            .await
            .map_err(|e| IndexError::Decode(format!("invalid JSON response: {e}")))?;

        let mut hits = decoded.hits;
        hits.truncate(query.hits_per_page);
        debug!(hits = hits.len(), "algolia_query_ok");
        Ok(hits)
    }

    fn backend_name(&self) -> &'static str {
        "algolia"
    }
}
