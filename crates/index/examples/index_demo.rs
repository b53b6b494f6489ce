use chrono::NaiveDate;
use criteria::{AgeInput, CriteriaBuilder, SearchCriteria, SearchMode};
use index::{InMemorySearchIndex, SearchDocument, SearchIndexGateway};
use profile::{Answer, SubscriptionTier, UserProfile};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
    let index = InMemorySearchIndex::new();

    // Seed the index with three members, two of whom like hiking.
    let profiles = vec![
        UserProfile::new("jo", "Jo")
            .with_state("CA")
            .with_age(27)
            .with_answer(Answer::new("Hobbies").with_words(["Hiking", "Board games"])),
        UserProfile::new("sam", "Sam")
            .with_state("CA")
            .with_age(44)
            .with_tier(SubscriptionTier::DatingEnabled)
            .with_answer(Answer::new("Hobbies").with_text("Hiking and more hiking")),
        UserProfile::new("lee", "Lee").with_state("OR").with_age(31),
    ];
    for profile in &profiles {
        index.upsert(SearchDocument::from_profile(profile, today))?;
    }
    println!("Indexed {} documents.", index.len());

    let builder = CriteriaBuilder::default();
    let criteria = SearchCriteria::new("lee", SearchMode::Friend)
        .with_state("CA")
        .with_age(AgeInput::new(18, 50))
        .with_words(["hiking"]);
    let query = builder.build(&criteria)?;
    println!("filters: {}", query.filter_expression());
    println!("numeric: {:?}", query.numeric_expressions());

    let hits = index.query(&query).await?;
    println!("Hits: {hits:#?}");

    let dating = builder.build(&SearchCriteria::new("lee", SearchMode::Dating))?;
    let dating_hits = index.query(&dating).await?;
    println!("Dating-facet hits: {dating_hits:#?}");

    Ok(())
}
