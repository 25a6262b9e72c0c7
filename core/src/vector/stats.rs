use crate::DocId;
use std::collections::BTreeMap;

/// Raw term counts of one document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TermCounts {
    counts: BTreeMap<String, u32>,
    total: u32,
}

impl TermCounts {
    pub fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    /// Number of term occurrences in the document.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn tf(&self, term: &str) -> f64 {
        match self.counts.get(term) {
            Some(&c) if self.total > 0 => c as f64 / self.total as f64,
            _ => 0.0,
        }
    }
}

/// Per-document term counts and corpus-wide document frequencies.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CorpusStatistics {
    documents: BTreeMap<DocId, TermCounts>,
    document_frequency: BTreeMap<String, u32>,
}

impl CorpusStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every occurrence in `terms` towards `doc`. Adding to a document
    /// that is already present extends its counts.
    pub fn add_document<I, S>(&mut self, doc: DocId, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.documents.entry(doc).or_default();
        for term in terms {
            let term = term.as_ref();
            let count = entry.counts.entry(term.to_string()).or_insert(0);
            if *count == 0 {
                *self.document_frequency.entry(term.to_string()).or_insert(0) += 1;
            }
            *count += 1;
            entry.total += 1;
        }
    }

    /// Combine partial statistics gathered by separate workers.
    pub fn merge(mut self, other: Self) -> Self {
        for (doc, counts) in other.documents {
            let entry = self.documents.entry(doc).or_default();
            for (term, c) in counts.counts {
                *entry.counts.entry(term).or_insert(0) += c;
            }
            entry.total += counts.total;
        }
        self.recount_document_frequency();
        self
    }

    fn recount_document_frequency(&mut self) {
        let mut df: BTreeMap<String, u32> = BTreeMap::new();
        for counts in self.documents.values() {
            for term in counts.counts.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }
        self.document_frequency = df;
    }

    pub fn documents(&self) -> &BTreeMap<DocId, TermCounts> {
        &self.documents
    }

    pub fn document_frequency(&self) -> &BTreeMap<String, u32> {
        &self.document_frequency
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    /// log10(N / df); `None` for a term no document contains.
    pub fn idf(&self, term: &str) -> Option<f64> {
        let df = *self.document_frequency.get(term)?;
        Some(idf(self.num_documents(), df))
    }
}

pub(crate) fn idf(num_documents: usize, df: u32) -> f64 {
    (num_documents as f64 / df as f64).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_frequencies() {
        let mut stats = CorpusStatistics::new();
        stats.add_document(DocId::from("1"), ["a", "b", "a"]);
        stats.add_document(DocId::from("2"), ["b", "c"]);
        let d1 = &stats.documents()[&DocId::from("1")];
        assert_eq!(d1.total(), 3);
        assert!((d1.tf("a") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.document_frequency()["b"], 2);
        assert_eq!(stats.document_frequency()["a"], 1);
        assert_eq!(stats.idf("b"), Some(0.0));
        assert!((stats.idf("c").unwrap() - 2f64.log10()).abs() < 1e-12);
        assert_eq!(stats.idf("zzz"), None);
    }

    #[test]
    fn merged_partials_equal_sequential() {
        let mut seq = CorpusStatistics::new();
        seq.add_document(DocId::from("1"), ["a", "b"]);
        seq.add_document(DocId::from("2"), ["b", "b"]);

        let mut left = CorpusStatistics::new();
        left.add_document(DocId::from("1"), ["a", "b"]);
        let mut right = CorpusStatistics::new();
        right.add_document(DocId::from("2"), ["b", "b"]);

        assert_eq!(left.merge(right), seq);
    }
}
