use std::sync::Arc;

use chrono::NaiveDate;
use discovery::{
    build_service_with_index, AgeInput, Answer, CriteriaBuilder, DiscoveryConfig,
    InMemoryProfileStore, InMemorySearchIndex, MatchSearchService, SearchCriteria,
    SearchDocument, SearchMode, SubscriptionTier, UserId, UserProfile,
};

const STATES: [&str; 4] = ["CA", "NY", "TX", "WA"];
const WORDS: [&str; 5] = ["hiking", "chess", "music", "cooking", "games"];

fn population() -> Vec<UserProfile> {
    (0..40u32)
        .map(|i| {
            let tier = if i % 3 == 0 {
                SubscriptionTier::DatingEnabled
            } else {
                SubscriptionTier::Free
            };
            let mut profile = UserProfile::new(format!("User{i:02}"), format!("member {i}"))
                .with_state(STATES[i as usize % STATES.len()])
                .with_tier(tier)
                .with_answer(Answer::new("Interests").with_words([
                    WORDS[i as usize % WORDS.len()],
                    WORDS[(i as usize + 2) % WORDS.len()],
                ]));
            // Every seventh profile has no age on file.
            if i % 7 != 0 {
                profile = profile.with_age(18 + (i * 2) % 70);
            }
            profile
        })
        .collect()
}

fn service() -> Arc<MatchSearchService> {
    let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let profiles = population();
    let index = InMemorySearchIndex::with_documents(
        profiles
            .iter()
            .map(|profile| SearchDocument::from_profile(profile, today)),
    );
    build_service_with_index(
        &DiscoveryConfig::default(),
        Arc::new(index),
        Arc::new(InMemoryProfileStore::with_profiles(profiles)),
    )
    .unwrap()
}

fn criteria_grid() -> Vec<SearchCriteria> {
    let ages = [
        AgeInput::unset(),
        AgeInput::new(25, 40),
        AgeInput::new(60, 20),
        AgeInput::new("", 30),
        AgeInput::new("abc", "200"),
    ];
    let mut grid = Vec::new();
    for mode in [SearchMode::Friend, SearchMode::Dating] {
        for state in ["", "CA", "ny"] {
            for age in &ages {
                for words in [&[][..], &["chess"][..], &["music", "games"][..]] {
                    grid.push(
                        SearchCriteria::new("user03", mode)
                            .with_state(state)
                            .with_age(age.clone())
                            .with_words(words.iter().copied()),
                    );
                }
            }
        }
    }
    grid
}

#[tokio::test]
async fn repeated_searches_return_identical_lists() {
    let service = service();
    for criteria in criteria_grid() {
        let first = service.search(&criteria).await.unwrap();
        let second = service.search(&criteria).await.unwrap();
        assert_eq!(first, second, "{criteria:?}");
    }
}

#[tokio::test]
async fn results_respect_requester_range_and_mode() {
    let service = service();
    let builder = CriteriaBuilder::default();
    let requester = UserId::new("user03");

    for criteria in criteria_grid() {
        let query = service.compile(&criteria).unwrap();
        let range = query.age_range;
        let results = service.search(&criteria).await.unwrap();

        assert!(results.len() <= builder.config().hits_per_page);
        for result in &results {
            assert_ne!(result.user_id, requester, "{criteria:?}");
            if let Some(age) = result.age {
                assert!(range.contains(age), "{age} outside {range:?}");
            }
            if criteria.mode == SearchMode::Dating {
                let n: u32 = result.user_id.as_str()[4..].parse().unwrap();
                assert_eq!(n % 3, 0, "{} is not dating-enabled", result.user_id);
            }
        }
        let mut ids: Vec<&UserId> = results.iter().map(|r| &r.user_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), results.len());
    }
}

#[tokio::test]
async fn compiled_query_is_pure() {
    let service = service();
    for criteria in criteria_grid() {
        assert_eq!(
            service.compile(&criteria).unwrap(),
            service.compile(&criteria).unwrap()
        );
    }
}
