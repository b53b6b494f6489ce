//! Authoritative user-profile layer for candidate discovery.
//!
//! The primary store is the only source the discovery stack trusts for
//! entitlement decisions. The search index carries a denormalized copy of a
//! few profile fields, but that copy lags writes and is never consulted for
//! access control.
//!
//! ## Core Types
//!
//! - [`UserId`]: trimmed, lowercased identifier. Every comparison between a
//!   requester and a candidate goes through this type.
//! - [`SubscriptionTier`]: open-ended tier enum; only
//!   [`SubscriptionTier::DatingEnabled`] grants dating visibility.
//! - [`UserProfile`] / [`Answer`]: the stored profile and its questionnaire answers.
//! - [`PrimaryStoreGateway`]: read-only async port onto the store, with an
//!   in-memory implementation in [`InMemoryProfileStore`].

mod error;
mod id;
mod store;
mod tier;
mod types;

pub use crate::error::StoreError;
pub use crate::id::UserId;
pub use crate::store::{InMemoryProfileStore, PrimaryStoreGateway};
pub use crate::tier::SubscriptionTier;
pub use crate::types::{age_between, Answer, UserProfile};
