use crate::tokenizer::NormalizedTerm;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Occurrence positions of one term in one document, strictly ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Posting(Vec<u32>);

impl Posting {
    /// Sorts and dedups; `None` for an empty list.
    pub fn from_positions(mut positions: Vec<u32>) -> Option<Self> {
        positions.sort_unstable();
        positions.dedup();
        (!positions.is_empty()).then_some(Self(positions))
    }

    pub fn positions(&self) -> &[u32] {
        &self.0
    }

    pub fn contains(&self, position: u32) -> bool {
        self.0.binary_search(&position).is_ok()
    }

    fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.windows(2).all(|w| w[0] < w[1])
    }
}

pub type TermPostings = BTreeMap<DocId, Posting>;

/// term -> doc -> positions. Read-only once built or loaded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, TermPostings>,
    universe: BTreeSet<DocId>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw postings, checking the stored invariants. The document
    /// universe is the union of all doc ids in the postings.
    pub fn from_postings(postings: BTreeMap<String, TermPostings>) -> Result<Self, String> {
        let mut universe = BTreeSet::new();
        for (term, docs) in &postings {
            if docs.is_empty() {
                return Err(format!("term '{term}' has no documents"));
            }
            for (doc, posting) in docs {
                if !posting.is_valid() {
                    return Err(format!("positions of '{term}' in '{doc}' are empty or not strictly ascending"));
                }
                universe.insert(doc.clone());
            }
        }
        Ok(Self { postings, universe })
    }

    pub fn postings(&self) -> &BTreeMap<String, TermPostings> {
        &self.postings
    }

    pub fn term(&self, term: &str) -> Option<&TermPostings> {
        self.postings.get(term)
    }

    pub fn posting(&self, term: &str, doc: &DocId) -> Option<&Posting> {
        self.postings.get(term)?.get(doc)
    }

    pub fn universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn stats(&self) -> IndexStats {
        let total_entries: usize = self.postings.values().map(BTreeMap::len).sum();
        let num_terms = self.postings.len();
        IndexStats {
            num_terms,
            num_documents: self.universe.len(),
            total_entries,
            avg_docs_per_term: if num_terms > 0 { total_entries as f64 / num_terms as f64 } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub num_terms: usize,
    pub num_documents: usize,
    pub total_entries: usize,
    pub avg_docs_per_term: f64,
}

/// Accumulates (doc, term, position) triples. Partial builders from
/// different workers combine with [`InvertedIndexBuilder::merge`].
#[derive(Debug, Default)]
pub struct InvertedIndexBuilder {
    raw: BTreeMap<String, BTreeMap<DocId, Vec<u32>>>,
}

impl InvertedIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc: &DocId, term: &str, position: u32) {
        self.raw
            .entry(term.to_string())
            .or_default()
            .entry(doc.clone())
            .or_default()
            .push(position);
    }

    pub fn add_document(&mut self, doc: &DocId, terms: &[NormalizedTerm]) {
        for t in terms {
            self.add(doc, &t.term, t.position);
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        for (term, docs) in other.raw {
            let into = self.raw.entry(term).or_default();
            for (doc, mut positions) in docs {
                into.entry(doc).or_default().append(&mut positions);
            }
        }
        self
    }

    pub fn finish(self) -> InvertedIndex {
        let mut postings = BTreeMap::new();
        let mut universe = BTreeSet::new();
        for (term, docs) in self.raw {
            let mut out = TermPostings::new();
            for (doc, positions) in docs {
                if let Some(posting) = Posting::from_positions(positions) {
                    universe.insert(doc.clone());
                    out.insert(doc, posting);
                }
            }
            if !out.is_empty() {
                postings.insert(term, out);
            }
        }
        InvertedIndex { postings, universe }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_sorted_and_deduplicated() {
        let mut b = InvertedIndexBuilder::new();
        let d = DocId::from("1");
        for p in [5, 1, 5, 3] {
            b.add(&d, "rome", p);
        }
        let index = b.finish();
        assert_eq!(index.posting("rome", &d).unwrap().positions(), &[1, 3, 5]);
    }

    #[test]
    fn merge_matches_single_builder() {
        let (d1, d2) = (DocId::from("1"), DocId::from("2"));
        let mut whole = InvertedIndexBuilder::new();
        let mut left = InvertedIndexBuilder::new();
        let mut right = InvertedIndexBuilder::new();
        for (b, d, t, p) in [(0, &d1, "a", 0), (1, &d2, "a", 0), (1, &d2, "b", 1), (0, &d1, "a", 2)] {
            whole.add(d, t, p);
            if b == 0 { left.add(d, t, p) } else { right.add(d, t, p) }
        }
        assert_eq!(whole.finish(), left.merge(right).finish());
    }

    #[test]
    fn rejects_unsorted_positions() {
        let mut docs = TermPostings::new();
        docs.insert(DocId::from("1"), Posting(vec![3, 1]));
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), docs);
        assert!(InvertedIndex::from_postings(raw).is_err());
    }

    #[test]
    fn stats_count_entries() {
        let mut b = InvertedIndexBuilder::new();
        b.add(&DocId::from("1"), "a", 0);
        b.add(&DocId::from("2"), "a", 0);
        b.add(&DocId::from("2"), "b", 1);
        let stats = b.finish().stats();
        assert_eq!(stats.num_terms, 2);
        assert_eq!(stats.num_documents, 2);
        assert_eq!(stats.total_entries, 3);
        assert!((stats.avg_docs_per_term - 1.5).abs() < 1e-12);
    }
}
