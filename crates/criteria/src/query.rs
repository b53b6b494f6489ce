use std::fmt;

use profile::{SubscriptionTier, UserId};
use serde::{Deserialize, Serialize};

use crate::{AgeRange, SearchMode};

/// Numeric attribute the age window is applied to.
pub const AGE_ATTRIBUTE: &str = "age";

/// Exact-match facet filter. All filters on a query are ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ExactFilter {
    /// `NOT objectID:"<id>"`
    ExcludeObject(UserId),
    /// `state:"<state>"`
    State(String),
    /// `subscriptionType:"<tier>"`
    SubscriptionType(SubscriptionTier),
}

impl ExactFilter {
    /// Index attribute this filter constrains.
    pub fn attribute(&self) -> &'static str {
        match self {
            ExactFilter::ExcludeObject(_) => "objectID",
            ExactFilter::State(_) => "state",
            ExactFilter::SubscriptionType(_) => "subscriptionType",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ExactFilter::ExcludeObject(id) => id.as_str(),
            ExactFilter::State(state) => state,
            ExactFilter::SubscriptionType(tier) => tier.as_str(),
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, ExactFilter::ExcludeObject(_))
    }

    /// Whether `value` satisfies this filter.
    pub fn admits(&self, value: Option<&str>) -> bool {
        let hit = value == Some(self.value());
        if self.is_negated() {
            !hit
        } else {
            hit
        }
    }
}

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

impl fmt::Display for ExactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negated() {
            f.write_str("NOT ")?;
        }
        write!(f, "{}:{}", self.attribute(), quote(self.value()))
    }
}

/// Inclusive numeric bound on [`AGE_ATTRIBUTE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericFilter {
    AtLeast(i64),
    AtMost(i64),
}

impl NumericFilter {
    pub fn admits(&self, value: i64) -> bool {
        match *self {
            NumericFilter::AtLeast(bound) => value >= bound,
            NumericFilter::AtMost(bound) => value <= bound,
        }
    }
}

impl fmt::Display for NumericFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericFilter::AtLeast(bound) => write!(f, "{AGE_ATTRIBUTE}>={bound}"),
            NumericFilter::AtMost(bound) => write!(f, "{AGE_ATTRIBUTE}<={bound}"),
        }
    }
}

/// Compiled, backend-neutral search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub requester_id: UserId,
    pub mode: SearchMode,
    /// Relevance text. Empty means "match everything the filters allow".
    pub text: String,
    pub filters: Vec<ExactFilter>,
    pub numeric_filters: Vec<NumericFilter>,
    pub age_range: AgeRange,
    pub hits_per_page: usize,
    pub attributes_to_retrieve: Vec<String>,
}

impl Query {
    /// Filters joined the way the hosted index expects them.
    pub fn filter_expression(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn numeric_expressions(&self) -> Vec<String> {
        self.numeric_filters.iter().map(ToString::to_string).collect()
    }

    pub fn state_filter(&self) -> Option<&str> {
        self.filters.iter().find_map(|filter| match filter {
            ExactFilter::State(state) => Some(state.as_str()),
            _ => None,
        })
    }

    pub fn tier_facet(&self) -> Option<&SubscriptionTier> {
        self.filters.iter().find_map(|filter| match filter {
            ExactFilter::SubscriptionType(tier) => Some(tier),
            _ => None,
        })
    }

    /// True when the query excludes `id` from results.
    pub fn excludes(&self, id: &UserId) -> bool {
        self.filters
            .iter()
            .any(|filter| matches!(filter, ExactFilter::ExcludeObject(excluded) if excluded == id))
    }

    /// Terms of the relevance text, lowercased.
    pub fn terms(&self) -> Vec<String> {
        self.text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}
