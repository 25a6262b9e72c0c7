use super::{SparseVector, VectorIndex, VocabIndex};
use crate::tokenizer::TermNormalizer;
use crate::DocId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// dot / (|q| * |d|), or 0 when either norm is 0. Clamped to [0, 1] so
/// rounding never pushes an exact match above 1.
pub fn cosine_similarity(query: &SparseVector, query_norm: f64, doc: &SparseVector, doc_norm: f64) -> f64 {
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    (query.dot(doc) / (query_norm * doc_norm)).clamp(0.0, 1.0)
}

/// Ranks documents by cosine similarity to free-text queries.
pub struct VectorSearchEngine {
    index: VectorIndex,
    normalizer: Arc<dyn TermNormalizer>,
}

impl VectorSearchEngine {
    pub fn new(index: VectorIndex, normalizer: Arc<dyn TermNormalizer>) -> Self {
        Self { index, normalizer }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Query TF-IDF vector and its norm. Terms missing from the vocabulary
    /// are dropped before term frequencies are computed.
    pub fn query_vector(&self, text: &str) -> (SparseVector, f64) {
        let mut counts: BTreeMap<VocabIndex, u32> = BTreeMap::new();
        for t in self.normalizer.normalize(text) {
            if let Some(id) = self.index.vocabulary().id(&t.term) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let total: u32 = counts.values().sum();
        if total == 0 {
            return (SparseVector::default(), 0.0);
        }
        let entries = counts
            .into_iter()
            .map(|(id, c)| {
                let idf = self.index.idf_by_id(id).unwrap_or(0.0);
                (id, c as f64 / total as f64 * idf)
            })
            .collect();
        let vector = SparseVector::from_entries(entries);
        let norm = vector.norm();
        (vector, norm)
    }

    /// Top `top_k` documents with similarity > 0, best first; equal scores
    /// fall back to [`DocId`] order. A `top_k` of 0 is treated as 1.
    pub fn search(&self, text: &str, top_k: usize) -> Vec<ScoredDoc> {
        let (query, query_norm) = self.query_vector(text);
        if query_norm == 0.0 {
            tracing::debug!(query = text, "no indexed terms in query");
            return Vec::new();
        }

        let mut hits: Vec<ScoredDoc> = self
            .index
            .documents()
            .iter()
            .filter(|d| d.norm > 0.0)
            .filter_map(|d| {
                let score = cosine_similarity(&query, query_norm, &d.vector, d.norm);
                (score > 0.0).then(|| ScoredDoc { doc_id: d.id.clone(), score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
        let total_hits = hits.len();
        hits.truncate(top_k.max(1));
        tracing::debug!(query = text, total_hits, returned = hits.len(), "vector search");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::PlainNormalizer;
    use crate::vector::CorpusStatistics;

    fn engine(docs: &[(&str, &str)]) -> VectorSearchEngine {
        let mut stats = CorpusStatistics::new();
        for (id, text) in docs {
            stats.add_document(DocId::from(*id), text.split_whitespace());
        }
        VectorSearchEngine::new(VectorIndex::build(&stats), Arc::new(PlainNormalizer))
    }

    #[test]
    fn zero_norm_gives_zero_similarity() {
        let v = SparseVector::from_entries(vec![(0, 1.0)]);
        assert_eq!(cosine_similarity(&v, 0.0, &v, 1.0), 0.0);
        assert_eq!(cosine_similarity(&v, 1.0, &v, 0.0), 0.0);
    }

    #[test]
    fn query_tf_uses_occurrence_counts() {
        let e = engine(&[("1", "x y"), ("2", "z")]);
        let (q, _) = e.query_vector("x x y unknown");
        let idf = 2f64.log10();
        assert!((q.get(0).unwrap() - 2.0 / 3.0 * idf).abs() < 1e-12);
        assert!((q.get(1).unwrap() - 1.0 / 3.0 * idf).abs() < 1e-12);
    }

    #[test]
    fn ties_break_by_doc_id() {
        let e = engine(&[("10", "apple"), ("9", "apple"), ("x", "pear"), ("2", "plum")]);
        let hits = e.search("apple", 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["9", "10"]);
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[test]
    fn unknown_query_returns_nothing() {
        let e = engine(&[("1", "a b"), ("2", "c")]);
        assert!(e.search("nothing here", 5).is_empty());
        assert!(e.search("", 5).is_empty());
    }
}
