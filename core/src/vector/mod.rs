//! TF-IDF vector space model.
//!
//! A [`VectorIndex`] holds the vocabulary (term <-> dense id, assigned in
//! sorted term order), one sparse TF-IDF vector and norm per document, and
//! the IDF table computed at build time. Queries reuse that IDF table.

pub mod search;
pub mod stats;

pub use search::{cosine_similarity, ScoredDoc, VectorSearchEngine, DEFAULT_TOP_K};
pub use stats::{CorpusStatistics, TermCounts};

use crate::DocId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type VocabIndex = u32;

/// Bijection between terms and `0..len()`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, VocabIndex>,
}

impl Vocabulary {
    /// Ids follow sorted term order, so the same term set always gets the
    /// same assignment.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = terms.into_iter().map(Into::into).collect();
        let terms: Vec<String> = sorted.into_iter().collect();
        let ids = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as VocabIndex)).collect();
        Self { terms, ids }
    }

    /// Rebuild from persisted assignments, checking they are a bijection
    /// onto `0..len`.
    pub fn from_assignments(assignments: BTreeMap<String, VocabIndex>) -> Result<Self, String> {
        let len = assignments.len();
        let mut terms: Vec<Option<String>> = vec![None; len];
        for (term, id) in &assignments {
            let slot = terms
                .get_mut(*id as usize)
                .ok_or_else(|| format!("vocabulary id {id} for '{term}' is out of range 0..{len}"))?;
            if let Some(prev) = slot.replace(term.clone()) {
                return Err(format!("vocabulary id {id} assigned to both '{prev}' and '{term}'"));
            }
        }
        let terms: Vec<String> = terms.into_iter().flatten().collect();
        Ok(Self { terms, ids: assignments.into_iter().collect() })
    }

    pub fn id(&self, term: &str) -> Option<VocabIndex> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: VocabIndex) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// (term, id) in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, VocabIndex)> {
        self.terms.iter().enumerate().map(|(i, t)| (t.as_str(), i as VocabIndex))
    }
}

/// Nonzero entries sorted by vocabulary index.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SparseVector {
    entries: Vec<(VocabIndex, f64)>,
}

impl SparseVector {
    /// Sorts by index, sums duplicates and drops zero weights.
    pub fn from_entries(mut entries: Vec<(VocabIndex, f64)>) -> Self {
        entries.sort_by_key(|(i, _)| *i);
        let mut out: Vec<(VocabIndex, f64)> = Vec::with_capacity(entries.len());
        for (i, w) in entries {
            match out.last_mut() {
                Some((last, acc)) if *last == i => *acc += w,
                _ => out.push((i, w)),
            }
        }
        out.retain(|(_, w)| *w != 0.0);
        Self { entries: out }
    }

    pub fn get(&self, index: VocabIndex) -> Option<f64> {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VocabIndex, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Walks the shorter vector and probes the longer one.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.iter().filter_map(|(i, w)| large.get(i).map(|v| w * v)).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentVector {
    pub id: DocId,
    pub vector: SparseVector,
    pub norm: f64,
}

/// Vocabulary, per-document vectors and norms, and the IDF table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VectorIndex {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    documents: Vec<DocumentVector>,
}

impl VectorIndex {
    /// TF = count / document length, IDF = log10(N / df), weight = TF * IDF.
    pub fn build(stats: &CorpusStatistics) -> Self {
        let n = stats.num_documents();
        let vocabulary = Vocabulary::from_terms(stats.document_frequency().keys().cloned());
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|(term, _)| stats::idf(n, stats.document_frequency()[term]))
            .collect();

        let documents = stats
            .documents()
            .iter()
            .map(|(doc, counts)| {
                let entries = counts
                    .counts()
                    .keys()
                    .filter_map(|term| {
                        let id = vocabulary.id(term)?;
                        Some((id, counts.tf(term) * idf[id as usize]))
                    })
                    .collect();
                let vector = SparseVector::from_entries(entries);
                let norm = vector.norm();
                DocumentVector { id: doc.clone(), vector, norm }
            })
            .collect();

        Self { vocabulary, idf, documents }
    }

    /// Assemble a loaded index. `idf` is indexed by vocabulary id.
    pub fn from_parts(vocabulary: Vocabulary, idf: Vec<f64>, mut documents: Vec<DocumentVector>) -> Result<Self, String> {
        if idf.len() != vocabulary.len() {
            return Err(format!("idf table has {} entries for {} terms", idf.len(), vocabulary.len()));
        }
        if let Some((term, _)) = vocabulary.iter().find(|(_, id)| !is_weight(idf[*id as usize])) {
            return Err(format!("idf of '{term}' is negative or not finite"));
        }
        for doc in &documents {
            if let Some((i, w)) = doc.vector.iter().find(|(i, w)| *i as usize >= vocabulary.len() || !is_weight(*w)) {
                return Err(format!("document '{}' has invalid entry {i} -> {w}", doc.id));
            }
            if !is_weight(doc.norm) || (doc.norm == 0.0) != doc.vector.is_empty() {
                return Err(format!("document '{}' has inconsistent norm {}", doc.id, doc.norm));
            }
        }
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(dup) = documents.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(format!("document '{}' appears twice", dup[0].id));
        }
        Ok(Self { vocabulary, idf, documents })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.id(term).map(|id| self.idf[id as usize])
    }

    pub fn idf_by_id(&self, id: VocabIndex) -> Option<f64> {
        self.idf.get(id as usize).copied()
    }

    /// Documents in [`DocId`] order.
    pub fn documents(&self) -> &[DocumentVector] {
        &self.documents
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }
}

fn is_weight(w: f64) -> bool {
    w.is_finite() && w >= 0.0
}
