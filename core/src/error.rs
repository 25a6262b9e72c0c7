//! Error types for lemma-core.
//!
//! Query errors abort a single query and carry the character offset that
//! triggered them. Index load errors are fatal at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling a boolean query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No token pattern matches at `position`
    #[error("lex error at position {position}: {message}")]
    Lex { position: usize, message: String },
    /// Token stream does not form a valid expression
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
}

impl QueryError {
    pub(crate) fn lex(position: usize, message: impl Into<String>) -> Self {
        Self::Lex { position, message: message.into() }
    }

    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax { position, message: message.into() }
    }

    /// Character offset into the query string.
    pub fn position(&self) -> usize {
        match self {
            Self::Lex { position, .. } | Self::Syntax { position, .. } => *position,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "lex",
            Self::Syntax { .. } => "syntax",
        }
    }
}

/// Errors raised while loading a persisted index artifact.
#[derive(Debug, Error)]
pub enum IndexLoadError {
    #[error("index artifact not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt index artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid index artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
