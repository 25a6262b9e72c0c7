use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Term(String),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::And => "AND".into(),
            TokenKind::Or => "OR".into(),
            TokenKind::Not => "NOT".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::Term(t) => format!("term '{t}'"),
            TokenKind::Eof => "end of query".into(),
        }
    }
}

/// A token and the character offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"')
}

/// Tokenize a query. The returned stream always ends with `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;
        let kind = match c {
            '(' => {
                pos += 1;
                TokenKind::LParen
            }
            ')' => {
                pos += 1;
                TokenKind::RParen
            }
            '"' => {
                let close = chars[start + 1..]
                    .iter()
                    .position(|&c| c == '"')
                    .ok_or_else(|| QueryError::lex(start, "unterminated quoted phrase"))?;
                let end = start + 1 + close;
                pos = end + 1;
                TokenKind::Term(chars[start + 1..end].iter().collect())
            }
            _ => {
                while pos < chars.len() && !is_delimiter(chars[pos]) {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                keyword(&word).unwrap_or(TokenKind::Term(word))
            }
        };
        tokens.push(Token { kind, position: start });
    }

    tokens.push(Token { kind: TokenKind::Eof, position: chars.len() });
    Ok(tokens)
}

fn keyword(word: &str) -> Option<TokenKind> {
    if word.eq_ignore_ascii_case("and") {
        Some(TokenKind::And)
    } else if word.eq_ignore_ascii_case("or") {
        Some(TokenKind::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Some(TokenKind::Not)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(q: &str) -> Vec<TokenKind> {
        tokenize(q).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("a and b Or NOT c"),
            vec![
                TokenKind::Term("a".into()),
                TokenKind::And,
                TokenKind::Term("b".into()),
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Term("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_a_term() {
        assert_eq!(kinds("android notes"), vec![
            TokenKind::Term("android".into()),
            TokenKind::Term("notes".into()),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn quoted_phrase_keeps_whitespace() {
        let toks = tokenize(r#"x AND "big  old city""#).unwrap();
        assert_eq!(toks[2].kind, TokenKind::Term("big  old city".into()));
        assert_eq!(toks[2].position, 6);
    }

    #[test]
    fn parens_split_terms() {
        assert_eq!(kinds("(a)"), vec![
            TokenKind::LParen,
            TokenKind::Term("a".into()),
            TokenKind::RParen,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn positions_are_char_offsets() {
        let toks = tokenize("Рим OR Цезарь").unwrap();
        assert_eq!(toks[1].position, 4);
        assert_eq!(toks[2].position, 7);
        assert_eq!(toks[3].position, 13);
    }

    #[test]
    fn unterminated_quote_is_a_lex_error() {
        let err = tokenize(r#"a AND "open"#).unwrap_err();
        assert!(matches!(err, QueryError::Lex { position: 6, .. }));
    }
}
