use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::{StoreError, SubscriptionTier, UserId, UserProfile};

/// Read-only port onto the authoritative profile store.
#[async_trait]
pub trait PrimaryStoreGateway: Send + Sync {
    /// Fetch one profile by id.
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, StoreError>;

    /// Ids of every profile currently on `tier`.
    ///
    /// Callers build an allow-set from this once per query cycle instead of
    /// issuing one read per candidate.
    async fn list_by_tier(&self, tier: &SubscriptionTier) -> Result<HashSet<UserId>, StoreError>;
}

#[async_trait]
impl<T: PrimaryStoreGateway + ?Sized> PrimaryStoreGateway for Arc<T> {
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, StoreError> {
        (**self).get_profile(id).await
    }

    async fn list_by_tier(&self, tier: &SubscriptionTier) -> Result<HashSet<UserId>, StoreError> {
        (**self).list_by_tier(tier).await
    }
}

/// An in-memory profile store using a `RwLock` around a `HashMap`.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles<I: IntoIterator<Item = UserProfile>>(profiles: I) -> Self {
        let map = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        Self {
            profiles: RwLock::new(map),
        }
    }

    /// Insert or replace a profile.
    pub fn upsert(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))?
            .insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Move a profile to another tier, as a checkout or cancellation would.
    pub fn set_tier(&self, id: &UserId, tier: SubscriptionTier) -> Result<(), StoreError> {
        let mut guard = self
            .profiles
            .write()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))?;
        let profile = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        profile.subscription_tier = tier;
        Ok(())
    }

    pub fn remove(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .write()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))?
            .remove(id))
    }

    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PrimaryStoreGateway for InMemoryProfileStore {
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, StoreError> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list_by_tier(&self, tier: &SubscriptionTier) -> Result<HashSet<UserId>, StoreError> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))?;
        let ids: HashSet<UserId> = guard
            .values()
            .filter(|profile| &profile.subscription_tier == tier)
            .map(|profile| profile.id.clone())
            .collect();
        debug!(tier = %tier, count = ids.len(), "store_list_by_tier");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryProfileStore {
        InMemoryProfileStore::with_profiles([
            UserProfile::new("A", "ann").with_tier(SubscriptionTier::DatingEnabled),
            UserProfile::new("b", "bob").with_tier(SubscriptionTier::SelfAdvocateFree),
            UserProfile::new("C", "cat").with_tier(SubscriptionTier::DatingEnabled),
        ])
    }

    #[tokio::test]
    async fn get_profile_normalizes_lookup() {
        let store = store();
        let profile = store.get_profile(&UserId::new("a")).await.unwrap();
        assert_eq!(profile.username, "ann");
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let err = store().get_profile(&UserId::new("zz")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(UserId::new("zz")));
    }

    #[tokio::test]
    async fn list_by_tier_returns_exact_members() {
        let ids = store()
            .list_by_tier(&SubscriptionTier::DatingEnabled)
            .await
            .unwrap();
        let expected: HashSet<UserId> = [UserId::new("a"), UserId::new("c")].into_iter().collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn tier_change_is_visible_to_next_read() {
        let store = store();
        store
            .set_tier(&UserId::new("c"), SubscriptionTier::Free)
            .unwrap();
        let ids = store
            .list_by_tier(&SubscriptionTier::DatingEnabled)
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("a"));
    }

    #[tokio::test]
    async fn shared_store_through_arc() {
        let store = Arc::new(store());
        let gateway: Arc<dyn PrimaryStoreGateway> = store.clone();
        store.remove(&UserId::new("a")).unwrap();
        assert!(gateway.get_profile(&UserId::new("a")).await.is_err());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn seeding_keeps_the_last_profile_per_id() {
        let store = InMemoryProfileStore::with_profiles([
            UserProfile::new("Dee", "old"),
            UserProfile::new(" dee ", "new"),
        ]);
        assert_eq!(store.len(), 1);
        let profile = store.get_profile(&UserId::new("DEE")).await.unwrap();
        assert_eq!(profile.username, "new");
    }
}
