use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{SubscriptionTier, UserId};

/// One questionnaire answer: tag words picked from a list plus free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question: String,
    #[serde(default)]
    pub selected_words: BTreeSet<String>,
    #[serde(default)]
    pub text_answer: String,
}

impl Answer {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
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
        self.text_answer = text.into();
        self
    }
}

/// Authoritative profile as held by the primary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    /// Explicit age, used only when no birthdate is stored.
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, rename = "subscriptionType")]
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub attribute_answers: Vec<Answer>,
    #[serde(default)]
    pub dating_answers: Vec<Answer>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            state: None,
            birthdate: None,
            age: None,
            subscription_tier: SubscriptionTier::default(),
            profile_picture: None,
            attribute_answers: Vec::new(),
            dating_answers: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_birthdate(mut self, birthdate: NaiveDate) -> Self {
        self.birthdate = Some(birthdate);
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.subscription_tier = tier;
        self
    }

    pub fn with_picture(mut self, url: impl Into<String>) -> Self {
        self.profile_picture = Some(url.into());
        self
    }

    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.attribute_answers.push(answer);
        self
    }

    pub fn with_dating_answer(mut self, answer: Answer) -> Self {
        self.dating_answers.push(answer);
        self
    }

    /// Age on `today`, preferring the birthdate over the stored age.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        match self.birthdate {
            Some(birthdate) => age_between(birthdate, today),
            None => self.age,
        }
    }

    /// Dating answers are only visible while the profile's tier allows dating.
    pub fn visible_dating_answers(&self) -> &[Answer] {
        if self.subscription_tier.allows_dating() {
            &self.dating_answers
        } else {
            &[]
        }
    }
}

/// Whole years elapsed between `birthdate` and `today`.
///
/// Returns `None` when the birthdate lies in the future.
pub fn age_between(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birthdate > today {
        return None;
    }
    let mut years = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
