use std::collections::BTreeSet;

use profile::UserId;
use serde::{Deserialize, Serialize};

/// Which discovery screen issued the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Friend,
    Dating,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Friend => "friend",
            SearchMode::Dating => "dating",
        }
    }
}

/// Age bounds as the stepper fields hold them: raw, possibly blank, text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeInput {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl AgeInput {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn new(min: impl ToString, max: impl ToString) -> Self {
        Self {
            min: Some(min.to_string()),
            max: Some(max.to_string()),
        }
    }

    pub fn bounds(min: Option<i64>, max: Option<i64>) -> Self {
        Self {
            min: min.map(|v| v.to_string()),
            max: max.map(|v| v.to_string()),
        }
    }
}

/// Raw UI selections for one search.
///
/// Created on every keystroke and superseded by the next edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub requester_id: UserId,
    #[serde(default)]
    pub state_filter: Option<String>,
    #[serde(default)]
    pub age_range: AgeInput,
    #[serde(default)]
    pub selected_words: BTreeSet<String>,
    #[serde(default)]
    pub free_text: String,
    #[serde(default)]
    pub mode: SearchMode,
}

impl SearchCriteria {
    pub fn new(requester_id: impl Into<UserId>, mode: SearchMode) -> Self {
        Self {
            requester_id: requester_id.into(),
            mode,
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state_filter = Some(state.into());
        self
    }

    pub fn with_age(mut self, age: AgeInput) -> Self {
        self.age_range = age;
        self
    }

    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = text.into();
        self
    }

    /// The state filter, treating blank input as "any state".
    pub fn state(&self) -> Option<&str> {
        self.state_filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
