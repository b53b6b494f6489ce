use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use criteria::{Query, SearchMode};
use profile::Answer;
use tracing::debug;

use crate::{IndexError, RawHit, SearchDocument, SearchIndexGateway};

/// An in-memory search index using a `RwLock` around a `BTreeMap`.
///
/// Relevance is the number of query-term occurrences across the username and
/// the answer words and text. Ties break on ascending objectID, so the same
/// query over the same documents always yields the same page.
#[derive(Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<BTreeMap<String, SearchDocument>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I: IntoIterator<Item = SearchDocument>>(documents: I) -> Self {
        let map = documents
            .into_iter()
            .map(|doc| (doc.object_id.clone(), doc))
            .collect();
        Self {
            documents: RwLock::new(map),
        }
    }

    pub fn upsert(&self, document: SearchDocument) -> Result<(), IndexError> {
        self.documents
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .insert(document.object_id.clone(), document);
        Ok(())
    }

    pub fn remove(&self, object_id: &str) -> Result<Option<SearchDocument>, IndexError> {
        Ok(self
            .documents
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .remove(object_id))
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_filters(doc: &SearchDocument, query: &Query) -> bool {
    let exact = query
        .filters
        .iter()
        .all(|filter| filter.admits(doc.facet(filter.attribute())));
    // Documents without an age never satisfy a numeric clause.
    let numeric = match doc.age {
        Some(age) => query
            .numeric_filters
            .iter()
            .all(|clause| clause.admits(i64::from(age))),
        None => query.numeric_filters.is_empty(),
    };
    exact && numeric
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn answer_tokens(answer: &Answer) -> Vec<String> {
    let mut out: Vec<String> = answer
        .selected_words
        .iter()
        .flat_map(|word| tokens(word))
        .collect();
    out.extend(tokens(&answer.text_answer));
    out
}

fn score(doc: &SearchDocument, terms: &[String], mode: SearchMode) -> usize {
    let mut haystack: Vec<String> = tokens(&doc.username).collect();
    for answer in &doc.question_answers {
        haystack.extend(answer_tokens(answer));
    }
    if mode == SearchMode::Dating {
        for answer in doc.dating_answers.values() {
            haystack.extend(answer_tokens(answer));
        }
    }
    terms
        .iter()
        .map(|term| haystack.iter().filter(|tok| *tok == term).count())
        .sum()
}

#[async_trait]
impl SearchIndexGateway for InMemorySearchIndex {
    async fn query(&self, query: &Query) -> Result<Vec<RawHit>, IndexError> {
        let guard = self
            .documents
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;

        let terms: Vec<String> = query.terms().iter().flat_map(|t| tokens(t)).collect();
        let mut scored: Vec<(usize, &SearchDocument)> = guard
            .values()
            .filter(|doc| matches_filters(doc, query))
            .map(|doc| (score(doc, &terms, query.mode), doc))
            .filter(|(score, _)| terms.is_empty() || *score > 0)
            .collect();

        // BTreeMap iteration is already objectID-ascending; a stable sort keeps it.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(query.hits_per_page);

        debug!(
            documents = guard.len(),
            hits = scored.len(),
            terms = terms.len(),
            "memory_index_query"
        );
        Ok(scored.into_iter().map(|(_, doc)| doc.to_hit()).collect())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
