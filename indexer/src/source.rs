use anyhow::{anyhow, Context, Result};
use lemma_core::{DocId, Document, DocumentSource};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: RawId,
    #[serde(alias = "body")]
    text: String,
}

impl From<InputDoc> for Document {
    fn from(doc: InputDoc) -> Self {
        let id = match doc.id {
            RawId::Text(s) => DocId::new(s),
            RawId::Number(n) => DocId::new(n.to_string()),
        };
        Document { id, text: doc.text }
    }
}

/// Documents from a file or a directory tree.
///
/// `.txt` files are one document each, keyed by file stem. `.json` files hold
/// one record or an array of records, `.jsonl` one record per line.
pub struct FsSource {
    files: Vec<PathBuf>,
}

impl FsSource {
    pub fn new(input: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = Vec::new();
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && matches!(extension(p), Some("txt" | "json" | "jsonl")) {
                    files.push(p.to_path_buf());
                }
            }
            files.sort();
        } else if input.is_file() {
            files.push(input.to_path_buf());
        } else {
            return Err(anyhow!("input path {} does not exist", input.display()));
        }
        tracing::info!(num_files = files.len(), input = %input.display(), "collected input files");
        Ok(Self { files })
    }
}

impl DocumentSource for FsSource {
    fn documents(&self) -> Box<dyn Iterator<Item = Result<Document>> + '_> {
        Box::new(self.files.iter().flat_map(|f| read_file(f)))
    }
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_file(file: &Path) -> Vec<Result<Document>> {
    match extension(file) {
        Some("jsonl") => read_jsonl(file),
        Some("json") => read_json(file),
        _ => vec![read_text(file)],
    }
}

fn read_text(file: &Path) -> Result<Document> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("no usable file name: {}", file.display()))?;
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(Document::new(stem, text))
}

fn read_jsonl(file: &Path) -> Vec<Result<Document>> {
    let f = match File::open(file) {
        Ok(f) => f,
        Err(e) => return vec![Err(anyhow!(e).context(format!("opening {}", file.display())))],
    };
    BufReader::new(f)
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|(n, line)| {
            let line = line?;
            let doc: InputDoc = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: bad record", file.display(), n + 1))?;
            Ok(doc.into())
        })
        .collect()
}

fn read_json(file: &Path) -> Vec<Result<Document>> {
    let parsed = File::open(file)
        .map_err(anyhow::Error::from)
        .and_then(|f| Ok(serde_json::from_reader::<_, serde_json::Value>(BufReader::new(f))?))
        .with_context(|| format!("reading {}", file.display()));
    let json = match parsed {
        Ok(json) => json,
        Err(e) => return vec![Err(e)],
    };
    let records = match json {
        serde_json::Value::Array(arr) => arr,
        other => vec![other],
    };
    records
        .into_iter()
        .enumerate()
        .map(|(n, v)| {
            let doc: InputDoc = serde_json::from_value(v)
                .with_context(|| format!("{}: record {n} is not a document", file.display()))?;
            Ok(doc.into())
        })
        .collect()
}
