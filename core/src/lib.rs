pub mod boolean;
pub mod corpus;
pub mod document;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod vector;

pub use boolean::{BooleanEngine, DocSet};
pub use corpus::{analyze_corpus, AnalyzedDocument, CorpusIndices};
pub use document::{sort_result_ids, DocId, Document, DocumentSource, MemorySource};
pub use error::{IndexLoadError, QueryError};
pub use index::{IndexStats, InvertedIndex, InvertedIndexBuilder, Posting};
pub use query::Query;
pub use tokenizer::{Language, LemmaNormalizer, NormalizedTerm, PlainNormalizer, TermNormalizer};
pub use vector::{ScoredDoc, SparseVector, VectorIndex, VectorSearchEngine, Vocabulary};
