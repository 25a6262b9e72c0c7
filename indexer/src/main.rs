mod source;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use lemma_core::persist::{load_all, save_inverted_index, save_meta, save_vector_index, IndexPaths, MetaFile};
use lemma_core::query;
use lemma_core::vector::DEFAULT_TOP_K;
use lemma_core::{analyze_corpus, BooleanEngine, CorpusIndices, DocId, Language, QueryError, VectorSearchEngine};
use source::FsSource;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query boolean and TF-IDF indices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// AND / OR / NOT query over the inverted index
    Boolean,
    /// Free text ranked by cosine similarity
    Vector,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both indices from .txt/.json/.jsonl files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Normalization profile: plain, english or russian
        #[arg(long, default_value = "english")]
        language: Language,
    },
    /// Run one query against a built index
    Search {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long, value_enum, default_value_t = Mode::Boolean)]
        mode: Mode,
        /// Query text
        #[arg(long, short)]
        query: String,
        /// Maximum number of ranked results (vector mode)
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        limit: usize,
        /// Print the parsed query tree (boolean mode)
        #[arg(long, default_value_t = false)]
        show_ast: bool,
        /// Print term positions inside this document (boolean mode)
        #[arg(long)]
        positions: Option<String>,
    },
    /// Print index statistics
    Stats {
        #[arg(long, default_value = "./index")]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, language } => build_index(&input, &output, language),
        Commands::Search { index, mode, query, limit, show_ast, positions } => match mode {
            Mode::Boolean => boolean_search(&index, &query, show_ast, positions.map(DocId::new)),
            Mode::Vector => vector_search(&index, &query, limit),
        },
        Commands::Stats { index } => print_stats(&index),
    }
}

fn build_index(input: &str, output: &str, language: Language) -> Result<()> {
    let source = FsSource::new(Path::new(input))?;
    let normalizer = language.normalizer();
    let docs = analyze_corpus(&source, normalizer.as_ref());
    let indices = CorpusIndices::build(&docs);

    let out_paths = IndexPaths::new(output);
    save_inverted_index(&out_paths, &indices.inverted)?;
    save_vector_index(&out_paths, &indices.vectors)?;
    let meta = MetaFile::new(
        indices.vectors.num_documents(),
        indices.inverted.num_terms(),
        indices.vectors.vocabulary().len(),
        language,
    );
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, num_docs = meta.num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn boolean_search(index: &str, input: &str, show_ast: bool, positions: Option<DocId>) -> Result<()> {
    let loaded = load_all(&IndexPaths::new(index))?;
    let parsed = match query::parse(input) {
        Ok(q) => q,
        Err(err) => {
            report_query_error(input, &err);
            return Err(err.into());
        }
    };
    if show_ast {
        println!("{}\n", parsed.to_tree_string());
    }

    let engine = BooleanEngine::new(loaded.inverted, loaded.meta.language.normalizer());
    let hits = engine.search(&parsed);
    println!("Found {} documents", hits.len());
    if !hits.is_empty() {
        let ids: Vec<String> = hits.iter().map(DocId::to_string).collect();
        println!("{}", ids.join(", "));
    }

    if let Some(doc) = positions.filter(|d| hits.contains(d)) {
        println!("\nPositions in {doc}:");
        for term in parsed.terms() {
            let found = engine.positions(term, &doc);
            if !found.is_empty() {
                println!("  '{term}': {found:?}");
            }
        }
    }
    Ok(())
}

fn report_query_error(input: &str, err: &QueryError) {
    eprintln!("{input}");
    eprintln!("{}^", " ".repeat(err.position()));
}

fn vector_search(index: &str, text: &str, limit: usize) -> Result<()> {
    let loaded = load_all(&IndexPaths::new(index))?;
    let engine = VectorSearchEngine::new(loaded.vectors, loaded.meta.language.normalizer());
    let hits = engine.search(text, limit);
    println!("Found {} documents", hits.len());
    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. {} (score: {:.4})", rank + 1, hit.doc_id, hit.score);
    }
    Ok(())
}

fn print_stats(index: &str) -> Result<()> {
    let loaded = load_all(&IndexPaths::new(index))?;
    let stats = loaded.inverted.stats();
    println!("created_at:        {}", loaded.meta.created_at);
    println!("language:          {}", loaded.meta.language);
    println!("documents:         {}", stats.num_documents);
    println!("terms:             {}", stats.num_terms);
    println!("posting entries:   {}", stats.total_entries);
    println!("avg docs per term: {:.2}", stats.avg_docs_per_term);
    println!("vocabulary size:   {}", loaded.vectors.vocabulary().len());
    Ok(())
}
