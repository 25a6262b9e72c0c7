use crate::error::QueryError;
use crate::index::{InvertedIndex, TermPostings};
use crate::query::{self, Query};
use crate::tokenizer::{NormalizedTerm, TermNormalizer};
use crate::document::{sort_result_ids, DocId};
use std::collections::BTreeSet;
use std::sync::Arc;

pub type DocSet = BTreeSet<DocId>;

/// Evaluates boolean queries against a loaded inverted index.
///
/// The engine holds no mutable state beyond the normalizer's memo cache, so
/// one instance can serve concurrent queries behind an `Arc`.
pub struct BooleanEngine {
    index: InvertedIndex,
    normalizer: Arc<dyn TermNormalizer>,
}

impl BooleanEngine {
    pub fn new(index: InvertedIndex, normalizer: Arc<dyn TermNormalizer>) -> Self {
        Self { index, normalizer }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Parse and evaluate. Result ids are ordered by [`sort_result_ids`].
    pub fn search_str(&self, input: &str) -> Result<Vec<DocId>, QueryError> {
        let query = query::parse(input)?;
        Ok(self.search(&query))
    }

    pub fn search(&self, query: &Query) -> Vec<DocId> {
        let mut hits: Vec<DocId> = self.evaluate(query).into_iter().collect();
        sort_result_ids(&mut hits);
        tracing::debug!(query = %query, hits = hits.len(), "boolean search");
        hits
    }

    pub fn evaluate(&self, query: &Query) -> DocSet {
        match query {
            Query::Term(raw) => self.resolve(raw),
            Query::And(l, r) => {
                let left = self.evaluate(l);
                if left.is_empty() {
                    return left;
                }
                intersect(left, self.evaluate(r))
            }
            Query::Or(l, r) => union(self.evaluate(l), self.evaluate(r)),
            Query::Not(q) => {
                let excluded = self.evaluate(q);
                self.index.universe().difference(&excluded).cloned().collect()
            }
        }
    }

    /// Positions at which `raw` occurs in `doc`. For a phrase these are the
    /// positions of its first term wherever the whole phrase matches.
    pub fn positions(&self, raw: &str, doc: &DocId) -> Vec<u32> {
        let terms = self.normalizer.normalize(raw);
        match terms.as_slice() {
            [] => Vec::new(),
            [single] => self
                .index
                .posting(&single.term, doc)
                .map(|p| p.positions().to_vec())
                .unwrap_or_default(),
            phrase => match self.phrase_postings(phrase) {
                Some(postings) => phrase_starts(phrase, &postings, doc),
                None => Vec::new(),
            },
        }
    }

    /// Documents matching one query term. Unknown terms match nothing.
    fn resolve(&self, raw: &str) -> DocSet {
        let terms = self.normalizer.normalize(raw);
        match terms.as_slice() {
            [] => DocSet::new(),
            [single] => self
                .index
                .term(&single.term)
                .map(|docs| docs.keys().cloned().collect())
                .unwrap_or_default(),
            phrase => self.resolve_phrase(phrase),
        }
    }

    fn phrase_postings(&self, phrase: &[NormalizedTerm]) -> Option<Vec<&TermPostings>> {
        phrase.iter().map(|t| self.index.term(&t.term)).collect()
    }

    fn resolve_phrase(&self, phrase: &[NormalizedTerm]) -> DocSet {
        let Some(postings) = self.phrase_postings(phrase) else {
            return DocSet::new();
        };
        let Some(rarest) = postings.iter().min_by_key(|p| p.len()) else {
            return DocSet::new();
        };
        rarest
            .keys()
            .filter(|doc| postings.iter().all(|p| p.contains_key(*doc)))
            .filter(|doc| !phrase_starts(phrase, &postings, doc).is_empty())
            .cloned()
            .collect()
    }
}

/// Start positions in `doc` where every phrase term sits at its offset from
/// the first term.
fn phrase_starts(phrase: &[NormalizedTerm], postings: &[&TermPostings], doc: &DocId) -> Vec<u32> {
    let Some(docs) = postings.iter().map(|p| p.get(doc)).collect::<Option<Vec<_>>>() else {
        return Vec::new();
    };
    let base = phrase[0].position;
    docs[0]
        .positions()
        .iter()
        .copied()
        .filter(|&start| {
            phrase.iter().zip(&docs).skip(1).all(|(t, posting)| posting.contains(start + (t.position - base)))
        })
        .collect()
}

fn intersect(a: DocSet, b: DocSet) -> DocSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.into_iter().filter(|d| large.contains(d)).collect()
}

fn union(a: DocSet, b: DocSet) -> DocSet {
    let (small, mut large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    large.extend(small);
    large
}
