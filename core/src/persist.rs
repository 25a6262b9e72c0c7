use crate::error::IndexLoadError;
use crate::index::{InvertedIndex, TermPostings};
use crate::tokenizer::Language;
use crate::vector::{DocumentVector, SparseVector, VectorIndex, VocabIndex, Vocabulary};
use crate::DocId;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_docs: usize,
    pub num_terms: usize,
    pub vocabulary_size: usize,
    #[serde(default)]
    pub language: Language,
}

impl MetaFile {
    pub fn new(num_docs: usize, num_terms: usize, vocabulary_size: usize, language: Language) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { version: FORMAT_VERSION, created_at, num_docs, num_terms, vocabulary_size, language }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted(&self) -> PathBuf { self.root.join("inverted_index.json") }
    pub fn vectors(&self) -> PathBuf { self.root.join("vectors.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// On-disk shape of the vector index.
#[derive(Debug, Serialize, Deserialize)]
struct VectorIndexFile {
    #[serde(default = "default_version")]
    version: u32,
    vocabulary: BTreeMap<String, VocabIndex>,
    doc_vectors: BTreeMap<DocId, BTreeMap<VocabIndex, f64>>,
    doc_norms: BTreeMap<DocId, f64>,
    idf: BTreeMap<String, f64>,
    num_documents: usize,
    vocabulary_size: usize,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl From<&VectorIndex> for VectorIndexFile {
    fn from(index: &VectorIndex) -> Self {
        let vocabulary = index.vocabulary();
        Self {
            version: FORMAT_VERSION,
            vocabulary: vocabulary.iter().map(|(t, id)| (t.to_string(), id)).collect(),
            doc_vectors: index.documents().iter().map(|d| (d.id.clone(), d.vector.iter().collect())).collect(),
            doc_norms: index.documents().iter().map(|d| (d.id.clone(), d.norm)).collect(),
            idf: vocabulary
                .iter()
                .map(|(t, id)| (t.to_string(), index.idf_by_id(id).unwrap_or(0.0)))
                .collect(),
            num_documents: index.num_documents(),
            vocabulary_size: vocabulary.len(),
        }
    }
}

impl VectorIndexFile {
    fn into_index(self) -> Result<VectorIndex, String> {
        if self.vocabulary_size != self.vocabulary.len() {
            return Err(format!(
                "vocabulary_size is {} but vocabulary has {} terms",
                self.vocabulary_size,
                self.vocabulary.len()
            ));
        }
        if self.num_documents != self.doc_vectors.len() {
            return Err(format!(
                "num_documents is {} but {} document vectors are stored",
                self.num_documents,
                self.doc_vectors.len()
            ));
        }
        let vocabulary = Vocabulary::from_assignments(self.vocabulary)?;
        let idf = vocabulary
            .iter()
            .map(|(term, _)| self.idf.get(term).copied().ok_or_else(|| format!("no idf for '{term}'")))
            .collect::<Result<Vec<f64>, String>>()?;
        if self.idf.len() != vocabulary.len() {
            return Err("idf table lists terms outside the vocabulary".to_string());
        }

        let mut norms = self.doc_norms;
        let mut documents = Vec::with_capacity(self.doc_vectors.len());
        for (id, entries) in self.doc_vectors {
            let norm = norms.remove(&id).ok_or_else(|| format!("no norm for document '{id}'"))?;
            let vector = SparseVector::from_entries(entries.into_iter().collect());
            documents.push(DocumentVector { id, vector, norm });
        }
        if let Some(id) = norms.keys().next() {
            return Err(format!("norm stored for unknown document '{id}'"));
        }
        VectorIndex::from_parts(vocabulary, idf, documents)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let json = serde_json::to_string_pretty(value)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IndexLoadError> {
    let mut f = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => IndexLoadError::Missing { path: path.to_path_buf() },
        _ => IndexLoadError::Io { path: path.to_path_buf(), source },
    })?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)
        .map_err(|source| IndexLoadError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&buf).map_err(|source| IndexLoadError::Corrupt { path: path.to_path_buf(), source })
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    write_json(&paths.inverted(), index.postings())
}

pub fn load_inverted_index(paths: &IndexPaths) -> Result<InvertedIndex, IndexLoadError> {
    let path = paths.inverted();
    let raw: BTreeMap<String, TermPostings> = read_json(&path)?;
    InvertedIndex::from_postings(raw).map_err(|reason| IndexLoadError::Invalid { path, reason })
}

pub fn save_vector_index(paths: &IndexPaths, index: &VectorIndex) -> Result<()> {
    write_json(&paths.vectors(), &VectorIndexFile::from(index))
}

pub fn load_vector_index(paths: &IndexPaths) -> Result<VectorIndex, IndexLoadError> {
    let path = paths.vectors();
    let file: VectorIndexFile = read_json(&path)?;
    if file.version != FORMAT_VERSION {
        return Err(IndexLoadError::UnsupportedVersion { found: file.version, expected: FORMAT_VERSION });
    }
    file.into_index().map_err(|reason| IndexLoadError::Invalid { path, reason })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    write_json(&paths.meta(), meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, IndexLoadError> {
    let meta: MetaFile = read_json(&paths.meta())?;
    if meta.version != FORMAT_VERSION {
        return Err(IndexLoadError::UnsupportedVersion { found: meta.version, expected: FORMAT_VERSION });
    }
    Ok(meta)
}

/// Everything a serving process needs, loaded and validated.
#[derive(Debug)]
pub struct LoadedIndex {
    pub meta: MetaFile,
    pub inverted: InvertedIndex,
    pub vectors: VectorIndex,
}

pub fn load_all(paths: &IndexPaths) -> Result<LoadedIndex, IndexLoadError> {
    let meta = load_meta(paths)?;
    let inverted = load_inverted_index(paths)?;
    let vectors = load_vector_index(paths)?;
    tracing::info!(
        root = %paths.root.display(),
        num_docs = vectors.num_documents(),
        num_terms = inverted.num_terms(),
        language = %meta.language,
        "loaded index"
    );
    Ok(LoadedIndex { meta, inverted, vectors })
}
