use std::fmt;

/// Parsed boolean query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A bare word or the inside of a quoted phrase, as typed.
    Term(String),
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
    Not(Box<Query>),
}

impl Query {
    pub fn term(t: impl Into<String>) -> Self {
        Query::Term(t.into())
    }

    pub fn and(l: Query, r: Query) -> Self {
        Query::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Query, r: Query) -> Self {
        Query::Or(Box::new(l), Box::new(r))
    }

    pub fn not(q: Query) -> Self {
        Query::Not(Box::new(q))
    }

    /// Terms in left-to-right order, including negated ones.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Query::Term(t) => out.push(t),
            Query::And(l, r) | Query::Or(l, r) => {
                l.collect_terms(out);
                r.collect_terms(out);
            }
            Query::Not(q) => q.collect_terms(out),
        }
    }

    /// Indented multi-line rendering.
    pub fn to_tree_string(&self) -> String {
        let mut s = String::new();
        self.write_tree(&mut s, 0);
        s
    }

    fn write_tree(&self, s: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            Query::Term(t) => s.push_str(&format!("{pad}Term({t})")),
            Query::And(l, r) | Query::Or(l, r) => {
                let op = if matches!(self, Query::And(..)) { "AND" } else { "OR" };
                s.push_str(&format!("{pad}{op}(\n"));
                l.write_tree(s, depth + 1);
                s.push('\n');
                r.write_tree(s, depth + 1);
                s.push_str(&format!("\n{pad})"));
            }
            Query::Not(q) => {
                s.push_str(&format!("{pad}NOT(\n"));
                q.write_tree(s, depth + 1);
                s.push_str(&format!("\n{pad})"));
            }
        }
    }
}

/// A term prints bare only if the lexer would read it back as the same term.
fn needs_quotes(term: &str) -> bool {
    term.is_empty()
        || term.chars().any(|c| c.is_whitespace() || matches!(c, '(' | ')'))
        || ["and", "or", "not"].iter().any(|k| term.eq_ignore_ascii_case(k))
}

/// One-line form that `query::parse` reads back into the same tree.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(t) if needs_quotes(t) => write!(f, "\"{t}\""),
            Query::Term(t) => write!(f, "{t}"),
            Query::And(l, r) => write!(f, "({l} AND {r})"),
            Query::Or(l, r) => write!(f, "({l} OR {r})"),
            Query::Not(q) if matches!(**q, Query::Not(_)) => write!(f, "NOT ({q})"),
            Query::Not(q) => write!(f, "NOT {q}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_fully_parenthesized() {
        let q = Query::or(Query::and(Query::term("a"), Query::not(Query::term("b"))), Query::term("big city"));
        assert_eq!(q.to_string(), "((a AND NOT b) OR \"big city\")");
    }

    #[test]
    fn display_parses_back() {
        let queries = [
            Query::not(Query::not(Query::term("a"))),
            Query::and(Query::term("and"), Query::not(Query::not(Query::not(Query::term("Or"))))),
            Query::or(Query::term("big city"), Query::term("")),
        ];
        for q in queries {
            let shown = q.to_string();
            assert_eq!(crate::query::parse(&shown).unwrap(), q, "{shown}");
        }
        assert_eq!(Query::not(Query::not(Query::term("a"))).to_string(), "NOT (NOT a)");
        assert_eq!(Query::term("and").to_string(), "\"and\"");
    }

    #[test]
    fn tree_rendering() {
        let q = Query::and(Query::term("a"), Query::not(Query::term("b")));
        assert_eq!(q.to_tree_string(), "AND(\n  Term(a)\n  NOT(\n    Term(b)\n  )\n)");
    }

    #[test]
    fn terms_in_order() {
        let q = Query::or(Query::not(Query::term("x")), Query::and(Query::term("y"), Query::term("z")));
        assert_eq!(q.terms(), vec!["x", "y", "z"]);
    }
}
