//! Corpus analysis and batch index construction.
//!
//! Documents are normalized independently on the rayon pool; postings and
//! term statistics are accumulated in per-worker partials and merged in a
//! single reduce, so the result does not depend on scheduling.

use crate::index::{InvertedIndex, InvertedIndexBuilder};
use crate::tokenizer::{NormalizedTerm, TermNormalizer};
use crate::vector::{CorpusStatistics, VectorIndex};
use crate::{DocId, DocumentSource};
use rayon::prelude::*;
use std::collections::HashSet;

/// A document after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedDocument {
    pub id: DocId,
    pub terms: Vec<NormalizedTerm>,
}

/// Read and normalize every document in `source`.
///
/// Extraction failures are logged and skipped. Duplicate ids keep the first
/// occurrence. Documents without any terms are dropped. Output is sorted by
/// [`DocId`].
pub fn analyze_corpus<S>(source: &S, normalizer: &dyn TermNormalizer) -> Vec<AnalyzedDocument>
where
    S: DocumentSource + ?Sized,
{
    let mut seen = HashSet::new();
    let mut docs = Vec::new();
    let mut skipped = 0usize;
    for item in source.documents() {
        match item {
            Ok(doc) if seen.insert(doc.id.clone()) => docs.push(doc),
            Ok(doc) => tracing::warn!(doc_id = %doc.id, "duplicate document id, keeping first"),
            Err(err) => {
                skipped += 1;
                tracing::warn!(error = %err, "skipping document");
            }
        }
    }

    let mut analyzed: Vec<AnalyzedDocument> = docs
        .into_par_iter()
        .filter_map(|doc| {
            let terms = normalizer.normalize(&doc.text);
            if terms.is_empty() {
                tracing::debug!(doc_id = %doc.id, "document has no terms");
                return None;
            }
            Some(AnalyzedDocument { id: doc.id, terms })
        })
        .collect();
    analyzed.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::info!(num_docs = analyzed.len(), skipped, "analyzed corpus");
    analyzed
}

/// Both indices for one corpus snapshot.
#[derive(Debug, Clone)]
pub struct CorpusIndices {
    pub inverted: InvertedIndex,
    pub vectors: VectorIndex,
    pub statistics: CorpusStatistics,
}

impl CorpusIndices {
    pub fn build(docs: &[AnalyzedDocument]) -> Self {
        let inverted = docs
            .par_iter()
            .fold(InvertedIndexBuilder::new, |mut b, doc| {
                b.add_document(&doc.id, &doc.terms);
                b
            })
            .reduce(InvertedIndexBuilder::new, InvertedIndexBuilder::merge)
            .finish();

        let statistics = docs
            .par_iter()
            .fold(CorpusStatistics::new, |mut s, doc| {
                s.add_document(doc.id.clone(), doc.terms.iter().map(|t| t.term.as_str()));
                s
            })
            .reduce(CorpusStatistics::new, CorpusStatistics::merge);

        let vectors = VectorIndex::build(&statistics);
        tracing::info!(
            num_docs = vectors.num_documents(),
            num_terms = inverted.num_terms(),
            vocabulary_size = vectors.vocabulary().len(),
            "built indices"
        );
        Self { inverted, vectors, statistics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::PlainNormalizer;
    use crate::{Document, MemorySource};
    use anyhow::anyhow;

    struct Flaky;

    impl DocumentSource for Flaky {
        fn documents(&self) -> Box<dyn Iterator<Item = anyhow::Result<Document>> + '_> {
            Box::new(
                vec![
                    Ok(Document::new("1", "alpha beta")),
                    Err(anyhow!("broken html")),
                    Ok(Document::new("2", "beta gamma")),
                ]
                .into_iter(),
            )
        }
    }

    #[test]
    fn failed_documents_are_skipped() {
        let docs = analyze_corpus(&Flaky, &PlainNormalizer);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn duplicates_and_empty_documents_are_dropped() {
        let source = MemorySource::new().with("3", "one").with("3", "two").with("4", "  ,, ").with("1", "x");
        let docs = analyze_corpus(&source, &PlainNormalizer);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(docs[1].terms[0].term, "one");
    }

    #[test]
    fn vectors_and_postings_cover_the_same_documents() {
        let source = MemorySource::new().with("1", "a b a").with("2", "b c").with("3", "a c c");
        let indices = CorpusIndices::build(&analyze_corpus(&source, &PlainNormalizer));
        let from_vectors: Vec<&DocId> = indices.vectors.documents().iter().map(|d| &d.id).collect();
        let from_postings: Vec<&DocId> = indices.inverted.universe().iter().collect();
        assert_eq!(from_vectors, from_postings);
    }
}
