use std::collections::BTreeMap;

use chrono::NaiveDate;
use profile::{Answer, SubscriptionTier, UserId, UserProfile};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Denormalized projection of a [`UserProfile`] as stored in the search index.
///
/// Eventually consistent with the primary store and never used for access
/// control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub username: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub question_answers: Vec<Answer>,
    /// Keyed by question.
    #[serde(default)]
    pub dating_answers: BTreeMap<String, Answer>,
    #[serde(default)]
    pub subscription_type: SubscriptionTier,
}

impl SearchDocument {
    /// Project a profile the way the index sync job writes it.
    pub fn from_profile(profile: &UserProfile, today: NaiveDate) -> Self {
        let dating_answers = profile
            .visible_dating_answers()
            .iter()
            .map(|answer| (answer.question.clone(), answer.clone()))
            .collect();
        Self {
            object_id: profile.id.as_str().to_string(),
            username: profile.username.clone(),
            state: profile.state.clone(),
            age: profile.age_on(today),
            profile_picture: profile.profile_picture.clone(),
            question_answers: profile.attribute_answers.clone(),
            dating_answers,
            subscription_type: profile.subscription_tier.clone(),
        }
    }

    /// Value of an exact-match facet attribute.
    pub fn facet(&self, attribute: &str) -> Option<&str> {
        match attribute {
            "objectID" => Some(self.object_id.as_str()),
            "state" => self.state.as_deref(),
            "subscriptionType" => Some(self.subscription_type.as_str()),
            _ => None,
        }
    }

    pub fn to_hit(&self) -> RawHit {
        RawHit {
            object_id: self.object_id.clone(),
            username: self.username.clone(),
            state: self.state.clone(),
            age: self.age.map(i64::from),
            profile_picture: self.profile_picture.clone(),
            question_answers: self.question_answers.clone(),
            dating_answers: self.dating_answers.clone(),
            subscription_type: Some(self.subscription_type.clone()),
        }
    }
}

/// One hit as returned by the search service.
///
/// Decoding is lenient: the index is fed by a separate job and older records
/// carry ages as strings, or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHit {
    #[serde(rename = "objectID", default)]
    pub object_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<i64>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub question_answers: Vec<Answer>,
    #[serde(default)]
    pub dating_answers: BTreeMap<String, Answer>,
    /// Denormalized tier. Advisory only.
    #[serde(default)]
    pub subscription_type: Option<SubscriptionTier>,
}

impl RawHit {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            ..Default::default()
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.subscription_type = Some(tier);
        self
    }

    /// Case-normalized id of the profile behind this hit.
    pub fn user_id(&self) -> UserId {
        UserId::new(&self.object_id)
    }
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}
