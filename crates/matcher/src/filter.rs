use std::collections::HashSet;

use criteria::{Query, SearchMode};
use index::RawHit;
use profile::UserId;

use crate::{Entitlement, MatchResult};

/// Per-reason drop counts for one filter pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub received: usize,
    pub kept: usize,
    pub malformed: usize,
    pub self_matches: usize,
    pub not_entitled: usize,
    pub out_of_range: usize,
    pub duplicates: usize,
}

/// Re-validates raw hits against rules the index cannot enforce.
///
/// Pure: the verdict depends only on the hits, the compiled query and the
/// entitlement read for this cycle. The hit's own `subscriptionType` is never
/// consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct EligibilityFilter;

impl EligibilityFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn filter(
        &self,
        hits: Vec<RawHit>,
        query: &Query,
        entitlement: &Entitlement,
    ) -> Vec<MatchResult> {
        self.filter_with_stats(hits, query, entitlement).0
    }

    pub fn filter_with_stats(
        &self,
        hits: Vec<RawHit>,
        query: &Query,
        entitlement: &Entitlement,
    ) -> (Vec<MatchResult>, FilterStats) {
        let mut stats = FilterStats {
            received: hits.len(),
            ..Default::default()
        };
        // A dating query without an allow-list fails closed.
        let gate_unavailable = query.mode == SearchMode::Dating && !entitlement.is_restricted();

        let mut seen: HashSet<UserId> = HashSet::with_capacity(hits.len());
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            let user_id = hit.user_id();
            if user_id.is_empty() {
                stats.malformed += 1;
                continue;
            }
            if user_id == query.requester_id {
                stats.self_matches += 1;
                continue;
            }
            if gate_unavailable || !entitlement.permits(&user_id) {
                stats.not_entitled += 1;
                continue;
            }
            // Unknown ages pass; the index already applied the numeric clauses.
            if let Some(age) = hit.age {
                if !query.age_range.contains(age) {
                    stats.out_of_range += 1;
                    continue;
                }
            }
            if !seen.insert(user_id.clone()) {
                stats.duplicates += 1;
                continue;
            }
            results.push(MatchResult {
                user_id,
                username: hit.username,
                state: hit.state,
                age: hit.age,
                profile_picture: hit.profile_picture,
                rank: results.len() + 1,
            });
        }

        stats.kept = results.len();
        (results, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use criteria::{AgeInput, CriteriaBuilder, SearchCriteria};
    use profile::SubscriptionTier;

    fn query(mode: SearchMode, age: AgeInput) -> Query {
        CriteriaBuilder::default()
            .build(&SearchCriteria::new("Me", mode).with_age(age))
            .unwrap()
    }

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.user_id.as_str()).collect()
    }

    #[test]
    fn drops_requester_regardless_of_case() {
        let q = query(SearchMode::Friend, AgeInput::unset());
        let hits = vec![RawHit::new("ME"), RawHit::new("you"), RawHit::new(" me ")];
        let (results, stats) =
            EligibilityFilter::new().filter_with_stats(hits, &q, &Entitlement::Unrestricted);
        assert_eq!(ids(&results), vec!["you"]);
        assert_eq!(stats.self_matches, 2);
    }

    #[test]
    fn dating_gate_ignores_denormalized_tier() {
        let q = query(SearchMode::Dating, AgeInput::unset());
        let allow = Entitlement::AllowList([UserId::new("ok")].into_iter().collect());
        let hits = vec![
            RawHit::new("stale").with_tier(SubscriptionTier::DatingEnabled),
            RawHit::new("ok").with_tier(SubscriptionTier::SelfAdvocateFree),
        ];
        let (results, stats) = EligibilityFilter::new().filter_with_stats(hits, &q, &allow);
        assert_eq!(ids(&results), vec!["ok"]);
        assert_eq!(stats.not_entitled, 1);
    }

    #[test]
    fn dating_without_allow_list_fails_closed() {
        let q = query(SearchMode::Dating, AgeInput::unset());
        let results =
            EligibilityFilter::new().filter(vec![RawHit::new("a")], &q, &Entitlement::Unrestricted);
        assert!(results.is_empty());
    }

    #[test]
    fn age_recheck_keeps_unknown_ages() {
        let q = query(SearchMode::Friend, AgeInput::new(25, 30));
        let hits = vec![
            RawHit::new("young").with_age(20),
            RawHit::new("fits").with_age(25),
            RawHit::new("unknown"),
            RawHit::new("old").with_age(31),
        ];
        let (results, stats) =
            EligibilityFilter::new().filter_with_stats(hits, &q, &Entitlement::Unrestricted);
        assert_eq!(ids(&results), vec!["fits", "unknown"]);
        assert_eq!(stats.out_of_range, 2);
    }

    #[test]
    fn dedups_and_ranks_in_relevance_order() {
        let q = query(SearchMode::Friend, AgeInput::unset());
        let hits = vec![
            RawHit::new("c"),
            RawHit::new(""),
            RawHit::new("a"),
            RawHit::new("C"),
            RawHit::new("b"),
        ];
        let (results, stats) =
            EligibilityFilter::new().filter_with_stats(hits, &q, &Entitlement::Unrestricted);
        assert_eq!(ids(&results), vec!["c", "a", "b"]);
        let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.received, 5);
        assert_eq!(stats.kept, 3);
    }
}
