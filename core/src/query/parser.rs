//! Recursive descent over the token stream.
//!
//! ```text
//! expr     := orExpr
//! orExpr   := andExpr (OR andExpr)*
//! andExpr  := notExpr (AND notExpr)*
//! notExpr  := NOT factor | factor
//! factor   := TERM | LPAREN orExpr RPAREN
//! ```

use super::ast::Query;
use super::lexer::{Token, TokenKind};
use crate::error::QueryError;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// `tokens` must end with `Eof`, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Query, QueryError> {
        if self.peek().kind == TokenKind::Eof {
            return Err(QueryError::syntax(self.peek().position, "empty query"));
        }
        let query = self.or_expr()?;
        let tok = self.peek();
        match tok.kind {
            TokenKind::Eof => Ok(query),
            TokenKind::RParen => Err(QueryError::syntax(tok.position, "unmatched ')'")),
            _ => Err(QueryError::syntax(
                tok.position,
                format!("expected operator before {}", tok.kind.describe()),
            )),
        }
    }

    fn peek(&self) -> &Token {
        // the lexer guarantees a trailing Eof and we never advance past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn or_expr(&mut self) -> Result<Query, QueryError> {
        let mut node = self.and_expr()?;
        while self.peek().kind == TokenKind::Or {
            self.advance();
            let right = self.and_expr()?;
            node = Query::or(node, right);
        }
        Ok(node)
    }

    fn and_expr(&mut self) -> Result<Query, QueryError> {
        let mut node = self.not_expr()?;
        while self.peek().kind == TokenKind::And {
            self.advance();
            let right = self.not_expr()?;
            node = Query::and(node, right);
        }
        Ok(node)
    }

    fn not_expr(&mut self) -> Result<Query, QueryError> {
        if self.peek().kind == TokenKind::Not {
            self.advance();
            return Ok(Query::not(self.factor()?));
        }
        self.factor()
    }

    fn factor(&mut self) -> Result<Query, QueryError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Term(t) => Ok(Query::Term(t)),
            TokenKind::LParen => {
                let inner = self.or_expr()?;
                let close = self.advance();
                match close.kind {
                    TokenKind::RParen => Ok(inner),
                    TokenKind::Eof => Err(QueryError::syntax(
                        tok.position,
                        "unmatched '(' (missing closing parenthesis)",
                    )),
                    other => Err(QueryError::syntax(
                        close.position,
                        format!("expected ')' but found {}", other.describe()),
                    )),
                }
            }
            TokenKind::Eof => Err(QueryError::syntax(tok.position, "unexpected end of query, expected a term")),
            other => Err(QueryError::syntax(
                tok.position,
                format!("unexpected {}, expected a term or '('", other.describe()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    fn t(s: &str) -> Query {
        Query::term(s)
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(parse("a AND b OR c").unwrap(), Query::or(Query::and(t("a"), t("b")), t("c")));
        assert_eq!(parse("a OR b AND c").unwrap(), Query::or(t("a"), Query::and(t("b"), t("c"))));
    }

    #[test]
    fn not_binds_its_factor_only() {
        assert_eq!(parse("a AND NOT b").unwrap(), Query::and(t("a"), Query::not(t("b"))));
        assert_eq!(parse("NOT a OR b").unwrap(), Query::or(Query::not(t("a")), t("b")));
    }

    #[test]
    fn operators_are_left_associative() {
        assert_eq!(parse("a OR b OR c").unwrap(), Query::or(Query::or(t("a"), t("b")), t("c")));
        assert_eq!(parse("a AND b AND c").unwrap(), Query::and(Query::and(t("a"), t("b")), t("c")));
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(
            parse("(a OR b) AND NOT (c AND d)").unwrap(),
            Query::and(Query::or(t("a"), t("b")), Query::not(Query::and(t("c"), t("d"))))
        );
    }

    #[test]
    fn phrase_is_one_term() {
        assert_eq!(parse(r#""big city" and rome"#).unwrap(), Query::and(t("big city"), t("rome")));
    }

    #[test]
    fn empty_query_is_rejected() {
        for q in ["", "   "] {
            assert!(matches!(parse(q), Err(QueryError::Syntax { .. })), "{q:?}");
        }
    }

    #[test]
    fn unmatched_open_paren_points_at_paren() {
        let err = parse("x AND (a").unwrap_err();
        assert_eq!(err, QueryError::Syntax { position: 6, message: "unmatched '(' (missing closing parenthesis)".into() });
        assert!(matches!(parse("(a"), Err(QueryError::Syntax { position: 0, .. })));
    }

    #[test]
    fn unmatched_close_paren() {
        assert!(matches!(parse("a)"), Err(QueryError::Syntax { position: 1, .. })));
    }

    #[test]
    fn adjacent_terms_need_an_operator() {
        assert!(matches!(parse("a b"), Err(QueryError::Syntax { position: 2, .. })));
    }

    #[test]
    fn missing_operands() {
        assert!(matches!(parse("a AND"), Err(QueryError::Syntax { position: 5, .. })));
        assert!(matches!(parse("OR a"), Err(QueryError::Syntax { position: 0, .. })));
        assert!(matches!(parse("NOT"), Err(QueryError::Syntax { .. })));
        assert!(matches!(parse("()"), Err(QueryError::Syntax { position: 1, .. })));
    }

    #[test]
    fn double_not_needs_parentheses() {
        assert!(parse("NOT NOT a").is_err());
        assert_eq!(parse("NOT (NOT a)").unwrap(), Query::not(Query::not(t("a"))));
    }
}
