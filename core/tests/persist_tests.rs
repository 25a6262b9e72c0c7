use lemma_core::persist::{
    load_all, load_inverted_index, load_vector_index, save_inverted_index, save_meta, save_vector_index, IndexPaths,
    MetaFile,
};
use lemma_core::{analyze_corpus, CorpusIndices, IndexLoadError, Language, MemorySource, PlainNormalizer};
use std::fs;
use tempfile::tempdir;

fn indices() -> CorpusIndices {
    let source = MemorySource::new().with("1", "a b a").with("2", "b c").with("10", "a c c");
    CorpusIndices::build(&analyze_corpus(&source, &PlainNormalizer))
}

fn write_all(paths: &IndexPaths, idx: &CorpusIndices) {
    save_inverted_index(paths, &idx.inverted).unwrap();
    save_vector_index(paths, &idx.vectors).unwrap();
    save_meta(
        paths,
        &MetaFile::new(idx.vectors.num_documents(), idx.inverted.num_terms(), idx.vectors.vocabulary().len(), Language::Plain),
    )
    .unwrap();
}

#[test]
fn saved_indices_load_back_identically() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let idx = indices();
    write_all(&paths, &idx);

    let loaded = load_all(&paths).unwrap();
    assert_eq!(loaded.inverted, idx.inverted);
    assert_eq!(loaded.vectors, idx.vectors);
    assert_eq!(loaded.meta.language, Language::Plain);
}

#[test]
fn output_is_byte_identical_across_builds() {
    let (d1, d2) = (tempdir().unwrap(), tempdir().unwrap());
    let (p1, p2) = (IndexPaths::new(d1.path()), IndexPaths::new(d2.path()));
    write_all(&p1, &indices());
    write_all(&p2, &indices());
    assert_eq!(fs::read(p1.inverted()).unwrap(), fs::read(p2.inverted()).unwrap());
    assert_eq!(fs::read(p1.vectors()).unwrap(), fs::read(p2.vectors()).unwrap());
}

#[test]
fn inverted_index_uses_term_doc_positions_layout() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    write_all(&paths, &indices());
    let json: serde_json::Value = serde_json::from_slice(&fs::read(paths.inverted()).unwrap()).unwrap();
    assert_eq!(json["a"]["1"], serde_json::json!([0, 2]));
    assert_eq!(json["c"]["10"], serde_json::json!([1, 2]));
}

#[test]
fn vector_index_uses_string_keys_and_counts() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    write_all(&paths, &indices());
    let json: serde_json::Value = serde_json::from_slice(&fs::read(paths.vectors()).unwrap()).unwrap();
    assert_eq!(json["vocabulary"]["a"], 0);
    assert_eq!(json["vocabulary_size"], 3);
    assert_eq!(json["num_documents"], 3);
    assert!(json["doc_vectors"]["2"]["2"].as_f64().unwrap() > 0.0);
}

#[test]
fn external_artifact_without_version_loads() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let raw = r#"{
        "vocabulary": {"rome": 0, "senate": 1},
        "doc_vectors": {"1": {"0": 0.15}, "2": {}},
        "doc_norms": {"1": 0.15, "2": 0.0},
        "idf": {"rome": 0.30103, "senate": 0.0},
        "num_documents": 2,
        "vocabulary_size": 2
    }"#;
    fs::write(paths.vectors(), raw).unwrap();
    let index = load_vector_index(&paths).unwrap();
    assert_eq!(index.vocabulary().id("senate"), Some(1));
    assert_eq!(index.documents()[0].vector.get(0), Some(0.15));
}

#[test]
fn missing_artifact_is_reported() {
    let dir = tempdir().unwrap();
    let err = load_inverted_index(&IndexPaths::new(dir.path())).unwrap_err();
    assert!(matches!(err, IndexLoadError::Missing { .. }));
}

#[test]
fn corrupt_artifact_is_reported() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    fs::write(paths.inverted(), "{ not json").unwrap();
    assert!(matches!(load_inverted_index(&paths), Err(IndexLoadError::Corrupt { .. })));
}

#[test]
fn invariant_violations_are_rejected() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());

    fs::write(paths.inverted(), r#"{"rome": {"1": []}}"#).unwrap();
    assert!(matches!(load_inverted_index(&paths), Err(IndexLoadError::Invalid { .. })));

    let bad_size = r#"{"vocabulary": {"rome": 0}, "doc_vectors": {}, "doc_norms": {},
        "idf": {"rome": 0.0}, "num_documents": 0, "vocabulary_size": 7}"#;
    fs::write(paths.vectors(), bad_size).unwrap();
    assert!(matches!(load_vector_index(&paths), Err(IndexLoadError::Invalid { .. })));

    let bad_index = r#"{"vocabulary": {"rome": 0}, "doc_vectors": {"1": {"4": 0.5}}, "doc_norms": {"1": 0.5},
        "idf": {"rome": 0.3}, "num_documents": 1, "vocabulary_size": 1}"#;
    fs::write(paths.vectors(), bad_index).unwrap();
    assert!(matches!(load_vector_index(&paths), Err(IndexLoadError::Invalid { .. })));
}

#[test]
fn unknown_version_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let raw = r#"{"version": 9, "vocabulary": {}, "doc_vectors": {}, "doc_norms": {}, "idf": {},
        "num_documents": 0, "vocabulary_size": 0}"#;
    fs::write(paths.vectors(), raw).unwrap();
    assert!(matches!(
        load_vector_index(&paths),
        Err(IndexLoadError::UnsupportedVersion { found: 9, .. })
    ));
}
