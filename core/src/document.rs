use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// External document identifier.
///
/// All-digit ids sort first, by numeric value; any other id sorts after them
/// in plain lexical order. Sets and score ties use this order; boolean result
/// lists go through [`sort_result_ids`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    fn numeric_key(&self) -> Option<&str> {
        self.is_numeric().then(|| self.0.trim_start_matches('0'))
    }
}

impl Ord for DocId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_key(), other.numeric_key()) {
            // digit strings without leading zeros compare by length, then lexically
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for DocId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Order a result list: numerically when every id is all-digit, otherwise
/// lexically by the raw strings, so `10` sorts before `9` in a mixed list.
pub fn sort_result_ids(ids: &mut [DocId]) {
    if ids.iter().all(DocId::is_numeric) {
        ids.sort();
    } else {
        ids.sort_by(|a, b| a.0.cmp(&b.0));
    }
}

/// A raw document as handed over by a [`DocumentSource`].
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Finite supply of raw documents. An `Err` item is a failed extraction of a
/// single document; the build skips it and carries on.
pub trait DocumentSource {
    fn documents(&self) -> Box<dyn Iterator<Item = Result<Document>> + '_>;
}

/// In-memory corpus.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    docs: Vec<Document>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<DocId>, text: impl Into<String>) -> Self {
        self.docs.push(Document::new(id, text));
        self
    }
}

impl FromIterator<Document> for MemorySource {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self { docs: iter.into_iter().collect() }
    }
}

impl DocumentSource for MemorySource {
    fn documents(&self) -> Box<dyn Iterator<Item = Result<Document>> + '_> {
        Box::new(self.docs.iter().cloned().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_sort_by_value() {
        let mut ids: Vec<DocId> = ["10", "9", "100", "2"].into_iter().map(DocId::from).collect();
        ids.sort();
        let got: Vec<&str> = ids.iter().map(DocId::as_str).collect();
        assert_eq!(got, vec!["2", "9", "10", "100"]);
    }

    #[test]
    fn mixed_ids_put_numeric_first() {
        let mut ids: Vec<DocId> = ["b", "10", "a", "9", "1a"].into_iter().map(DocId::from).collect();
        ids.sort();
        let got: Vec<&str> = ids.iter().map(DocId::as_str).collect();
        assert_eq!(got, vec!["9", "10", "1a", "a", "b"]);
    }

    #[test]
    fn result_lists_are_lexical_unless_all_numeric() {
        let mut mixed: Vec<DocId> = ["a", "9", "10"].into_iter().map(DocId::from).collect();
        sort_result_ids(&mut mixed);
        assert_eq!(mixed.iter().map(DocId::as_str).collect::<Vec<_>>(), vec!["10", "9", "a"]);

        let mut numeric: Vec<DocId> = ["10", "9", "100"].into_iter().map(DocId::from).collect();
        sort_result_ids(&mut numeric);
        assert_eq!(numeric.iter().map(DocId::as_str).collect::<Vec<_>>(), vec!["9", "10", "100"]);
    }

    #[test]
    fn leading_zeros_are_distinct_but_adjacent() {
        let a = DocId::from("007");
        let b = DocId::from("7");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert!(DocId::from("8") > a);
    }
}
