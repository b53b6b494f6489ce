use std::collections::HashSet;

use criteria::SearchMode;
use profile::{PrimaryStoreGateway, StoreError, SubscriptionTier, UserId};
use tracing::debug;

/// Who may appear in a result list, as decided by the primary store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    /// Friend search: no tier gating.
    Unrestricted,
    /// Dating search: only these ids are dating-enabled right now.
    AllowList(HashSet<UserId>),
}

impl Entitlement {
    pub fn permits(&self, id: &UserId) -> bool {
        match self {
            Entitlement::Unrestricted => true,
            Entitlement::AllowList(ids) => ids.contains(id),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Entitlement::AllowList(_))
    }
}

/// Read the entitlement for one query cycle.
///
/// Dating mode issues a single tier listing instead of one read per hit.
pub async fn resolve_entitlement<S>(store: &S, mode: SearchMode) -> Result<Entitlement, StoreError>
where
    S: PrimaryStoreGateway + ?Sized,
{
    match mode {
        SearchMode::Friend => Ok(Entitlement::Unrestricted),
        SearchMode::Dating => {
            let ids = store.list_by_tier(&SubscriptionTier::DatingEnabled).await?;
            debug!(allowed = ids.len(), "entitlement_resolved");
            Ok(Entitlement::AllowList(ids))
        }
    }
}
