use profile::SubscriptionTier;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    normalize_age, AgeRange, CriteriaError, ExactFilter, NumericFilter, Query, SearchCriteria,
    SearchMode,
};

/// Page-size ceiling enforced on every compiled query.
pub const MAX_HITS_PER_PAGE: usize = 50;

/// Knobs for [`CriteriaBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_hits_per_page")]
    pub hits_per_page: usize,
    /// Add `subscriptionType:"datingEnabled"` to dating queries. Narrows only.
    #[serde(default = "default_advisory_tier_facet")]
    pub advisory_tier_facet: bool,
}

fn default_hits_per_page() -> usize {
    MAX_HITS_PER_PAGE
}

fn default_advisory_tier_facet() -> bool {
    true
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            hits_per_page: default_hits_per_page(),
            advisory_tier_facet: default_advisory_tier_facet(),
        }
    }
}

impl BuilderConfig {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.hits_per_page == 0 {
            return Err(CriteriaError::InvalidConfig(
                "hits_per_page must be greater than zero".into(),
            ));
        }
        if self.hits_per_page > MAX_HITS_PER_PAGE {
            return Err(CriteriaError::InvalidConfig(format!(
                "hits_per_page must be <= {MAX_HITS_PER_PAGE}"
            )));
        }
        Ok(())
    }
}

/// Pure translation of [`SearchCriteria`] into a [`Query`].
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    cfg: BuilderConfig,
}

impl CriteriaBuilder {
    pub fn new(cfg: BuilderConfig) -> Result<Self, CriteriaError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.cfg
    }

    pub fn build(&self, criteria: &SearchCriteria) -> Result<Query, CriteriaError> {
        let (min, max) = normalize_age(&criteria.age_range);
        let range = AgeRange::new(min, max)?;
        self.build_with_range(criteria, range)
    }

    /// Like [`build`](Self::build) but with an already validated age window.
    pub fn build_with_range(
        &self,
        criteria: &SearchCriteria,
        age_range: AgeRange,
    ) -> Result<Query, CriteriaError> {
        if criteria.requester_id.is_empty() {
            return Err(CriteriaError::MissingRequester);
        }

        let mut filters = vec![ExactFilter::ExcludeObject(criteria.requester_id.clone())];
        if let Some(state) = criteria.state() {
            filters.push(ExactFilter::State(state.to_string()));
        }
        if criteria.mode == SearchMode::Dating && self.cfg.advisory_tier_facet {
            filters.push(ExactFilter::SubscriptionType(SubscriptionTier::DatingEnabled));
        }

        let numeric_filters = vec![
            NumericFilter::AtLeast(age_range.min()),
            NumericFilter::AtMost(age_range.max()),
        ];

        let text = relevance_text(criteria);
        let query = Query {
            requester_id: criteria.requester_id.clone(),
            mode: criteria.mode,
            text,
            filters,
            numeric_filters,
            age_range,
            hits_per_page: self.cfg.hits_per_page.min(MAX_HITS_PER_PAGE),
            attributes_to_retrieve: vec!["*".to_string()],
        };

        debug!(
            requester = %query.requester_id,
            mode = query.mode.as_str(),
            min_age = age_range.min(),
            max_age = age_range.max(),
            filter_count = query.filters.len(),
            "criteria_built"
        );
        Ok(query)
    }
}

fn relevance_text(criteria: &SearchCriteria) -> String {
    let free = criteria.free_text.trim();
    let mut parts: Vec<&str> = Vec::with_capacity(criteria.selected_words.len() + 1);
    if !free.is_empty() {
        parts.push(free);
    }
    parts.extend(
        criteria
            .selected_words
            .iter()
            .map(|word| word.trim())
            .filter(|word| !word.is_empty()),
    );
    parts.join(" ")
}
