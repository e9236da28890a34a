//! Token types for the Husk language.
//!
//! Each token carries its kind, lexeme (the raw source text), and the
//! 1-based line/column where it starts. Husk is line-oriented — declarations
//! end at line breaks — so runs of newlines are a token of their own rather
//! than skippable whitespace.

use std::fmt;

/// A region of source text in 1-based line/column coordinates.
///
/// `end_line`/`end_column` point one past the last character, so a span
/// covers `[column, end_column)` on a single line. Spans enable precise
/// error reporting: the CLI underlines exactly the characters inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span marking a position rather than a region.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (line, column) = (self.line, self.column).min((other.line, other.column));
        let (end_line, end_column) =
            (self.end_line, self.end_column).max((other.end_line, other.end_column));
        Span {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// All token kinds in the Husk language.
///
/// The kind is fieldless; the spelling of literals, symbols, and operators
/// lives in [`Token::text`]. That keeps kind comparisons `Copy`-cheap in the
/// parser's lookahead checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Natural number literal: `42`
    NatLit,
    /// Boolean literal: `True` or `False`
    BoolLit,
    /// Identifier: function names, variables, type names
    Symbol,
    /// Binary operator: one of `+ - * < <= == : !!`
    BinOp,

    // Punctuation
    DoubleColon, // ::
    Arrow,       // ->
    Eq,          // =
    Comma,       // ,
    LParen,      // (
    RParen,      // )
    LBracket,    // [
    RBracket,    // ]

    /// One or more consecutive line breaks.
    Eol,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// The region this token covers. Tokens never span lines.
    pub fn span(&self) -> Span {
        Span::new(
            self.line,
            self.column,
            self.line,
            self.column + self.text.chars().count() as u32,
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NatLit => write!(f, "natural literal"),
            TokenKind::BoolLit => write!(f, "boolean literal"),
            TokenKind::Symbol => write!(f, "identifier"),
            TokenKind::BinOp => write!(f, "binary operator"),
            TokenKind::DoubleColon => write!(f, "'::'"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Eol => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both_spans() {
        let a = Span::new(1, 5, 1, 8);
        let b = Span::new(2, 1, 2, 4);
        assert_eq!(a.merge(b), Span::new(1, 5, 2, 4));
        assert_eq!(b.merge(a), Span::new(1, 5, 2, 4));
    }

    #[test]
    fn merge_on_one_line_orders_by_column() {
        let a = Span::new(3, 10, 3, 12);
        let b = Span::new(3, 2, 3, 6);
        assert_eq!(a.merge(b), Span::new(3, 2, 3, 12));
    }

    #[test]
    fn token_span_covers_its_text() {
        let tok = Token::new(TokenKind::Symbol, "sum", 2, 4);
        assert_eq!(tok.span(), Span::new(2, 4, 2, 7));
    }
}
