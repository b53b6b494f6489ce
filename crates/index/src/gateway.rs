use std::sync::Arc;

use async_trait::async_trait;
use criteria::Query;

use crate::{IndexError, RawHit};

/// Thin read-only client onto the search service.
///
/// Implementations return at most `query.hits_per_page` hits ordered by
/// descending relevance.
#[async_trait]
pub trait SearchIndexGateway: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError>;

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str {
        "unknown"
    }
}

#[async_trait]
impl<T: SearchIndexGateway + ?Sized> SearchIndexGateway for Arc<T> {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        (**self).query(query).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

#[async_trait]
impl<T: SearchIndexGateway + ?Sized> SearchIndexGateway for Box<T> {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        (**self).query(query).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
