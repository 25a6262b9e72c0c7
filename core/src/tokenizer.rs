use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_'\-‐–—]*").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    // conjunctions and prepositions
    static ref RUSSIAN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "и","а","но","или","однако","зато","если","коли","когда","лишь","только","что","чтобы","как",
            "ежели","нежели","хотя","хоть","пусть","раз","кабы","коль","дабы","ибо","ведь","же","ли","да",
            "неужели","неужто","также","тоже","причем","причём","словно","будто",
            "в","на","с","к","по","из","за","от","без","через","для","при","о","об","у","под","над","между",
            "перед","около","вокруг","возле","после","вследствие","благодаря","вопреки","наперекор",
            "исключая","включая","ради","кроме","подобно","согласно","посреди","среди","внутри","вне",
            "позади","напротив","против","мимо","сквозь","близ","воз","поперек","напоперек"
        ];
        words.iter().copied().collect()
    };
}

/// A normalized term and the ordinal of the occurrence it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTerm {
    pub term: String,
    pub position: u32,
}

/// Raw text to normalized terms. The same instance (or an identically
/// configured one) must be used at build and query time.
pub trait TermNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Vec<NormalizedTerm>;
}

impl<N: TermNormalizer + ?Sized> TermNormalizer for Arc<N> {
    fn normalize(&self, text: &str) -> Vec<NormalizedTerm> {
        (**self).normalize(text)
    }
}

/// Split text into occurrences: NFKC, lowercase, word runs split on dashes.
/// Every returned part is one position.
fn occurrences(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut parts = Vec::new();
    for mat in RE.find_iter(&normalized) {
        for part in mat.as_str().split(is_dash) {
            let part = part.trim_matches('\'');
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
    }
    parts
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '‐' | '–' | '—')
}

/// Lowercased word runs, no filtering, no stemming.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainNormalizer;

impl TermNormalizer for PlainNormalizer {
    fn normalize(&self, text: &str) -> Vec<NormalizedTerm> {
        occurrences(text)
            .into_iter()
            .enumerate()
            .map(|(pos, term)| NormalizedTerm { term, position: pos as u32 })
            .collect()
    }
}

/// Lemma cache size used by [`LemmaNormalizer::with_cache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Stopword removal plus snowball stemming. Dropped occurrences still consume
/// their position.
pub struct LemmaNormalizer {
    stemmer: Stemmer,
    stopwords: &'static HashSet<&'static str>,
    cache: Option<LemmaCache>,
}

/// Bounded memo of token -> lemma. Once full, new tokens are stemmed but not
/// stored, so query traffic cannot grow it past `capacity`.
struct LemmaCache {
    entries: RwLock<HashMap<String, String>>,
    capacity: usize,
}

impl LemmaNormalizer {
    pub fn english() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::English), stopwords: &ENGLISH_STOPWORDS, cache: None }
    }

    pub fn russian() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::Russian), stopwords: &RUSSIAN_STOPWORDS, cache: None }
    }

    /// Memoize up to [`DEFAULT_CACHE_CAPACITY`] lemmas. The cache is safe to
    /// share between threads.
    pub fn with_cache(self) -> Self {
        self.with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Some(LemmaCache { entries: RwLock::new(HashMap::new()), capacity });
        self
    }

    /// Number of memoized lemmas; 0 without a cache.
    pub fn cached_lemmas(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.entries.read().len())
    }

    fn lemma(&self, token: &str) -> String {
        let Some(cache) = &self.cache else {
            return self.stemmer.stem(token).into_owned();
        };
        if let Some(hit) = cache.entries.read().get(token) {
            return hit.clone();
        }
        let lemma = self.stemmer.stem(token).into_owned();
        let mut entries = cache.entries.write();
        if entries.len() < cache.capacity {
            entries.insert(token.to_string(), lemma.clone());
        }
        lemma
    }
}

impl fmt::Debug for LemmaNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmaNormalizer")
            .field("stopwords", &self.stopwords.len())
            .field("cache_capacity", &self.cache.as_ref().map(|c| c.capacity))
            .finish()
    }
}

/// A token is indexable when it has no digits and at least two letters.
fn is_valid_token(token: &str) -> bool {
    if token.chars().any(|c| c.is_numeric()) {
        return false;
    }
    token.chars().filter(|c| c.is_alphabetic()).count() >= 2
}

impl TermNormalizer for LemmaNormalizer {
    fn normalize(&self, text: &str) -> Vec<NormalizedTerm> {
        let mut terms = Vec::new();
        for (pos, token) in occurrences(text).iter().enumerate() {
            if !is_valid_token(token) || self.stopwords.contains(token.as_str()) {
                continue;
            }
            terms.push(NormalizedTerm { term: self.lemma(token), position: pos as u32 });
        }
        terms
    }
}

/// Normalization profile, persisted with the index so that serving uses the
/// same normalizer as the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Plain,
    #[default]
    English,
    Russian,
}

impl Language {
    pub fn normalizer(self) -> Arc<dyn TermNormalizer> {
        match self {
            Language::Plain => Arc::new(PlainNormalizer),
            Language::English => Arc::new(LemmaNormalizer::english().with_cache()),
            Language::Russian => Arc::new(LemmaNormalizer::russian().with_cache()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Plain => "plain",
            Language::English => "english",
            Language::Russian => "russian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Language::Plain),
            "english" | "en" => Ok(Language::English),
            "russian" | "ru" => Ok(Language::Russian),
            other => Err(format!("unknown language '{other}' (expected plain, english or russian)")),
        }
    }
}
