use std::fmt;

use serde::{Deserialize, Serialize};

/// Subscription tier stored on a profile.
///
/// The set of tiers grows with the product, and the search index may still
/// hold tiers that were renamed long ago, so unknown values are preserved in
/// [`SubscriptionTier::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Plus,
    SelfAdvocateFree,
    SelfAdvocatePlus,
    DatingEnabled,
    Supporter,
    Other(String),
}

impl SubscriptionTier {
    /// Wire name used by the primary store and the search index.
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Plus => "plus",
            SubscriptionTier::SelfAdvocateFree => "selfAdvocateFree",
            SubscriptionTier::SelfAdvocatePlus => "selfAdvocatePlus",
            SubscriptionTier::DatingEnabled => "datingEnabled",
            SubscriptionTier::Supporter => "supporter",
            SubscriptionTier::Other(raw) => raw.as_str(),
        }
    }

    /// Whether profiles on this tier may appear in, and see, dating results.
    pub fn allows_dating(&self) -> bool {
        matches!(self, SubscriptionTier::DatingEnabled)
    }

    pub fn parse(raw: &str) -> Self {
        const KNOWN: [SubscriptionTier; 6] = [
            SubscriptionTier::Free,
            SubscriptionTier::Plus,
            SubscriptionTier::SelfAdvocateFree,
            SubscriptionTier::SelfAdvocatePlus,
            SubscriptionTier::DatingEnabled,
            SubscriptionTier::Supporter,
        ];
        let trimmed = raw.trim();
        KNOWN
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| SubscriptionTier::Other(trimmed.to_string()))
    }
}

impl From<String> for SubscriptionTier {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for SubscriptionTier {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<SubscriptionTier> for String {
    fn from(value: SubscriptionTier) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
