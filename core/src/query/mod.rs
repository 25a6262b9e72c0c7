//! Boolean query compiler: query string to [`Query`] AST.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::Query;
pub use lexer::{Token, TokenKind};

use crate::error::QueryError;

/// Compile a boolean query string.
pub fn parse(input: &str) -> Result<Query, QueryError> {
    let tokens = lexer::tokenize(input)?;
    parser::Parser::new(tokens).parse()
}
