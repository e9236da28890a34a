//! Lexer — tokenizes Husk source code as a lazy stream.
//!
//! The lexer hands out one token at a time through [`Lexer::next_token`],
//! with a single token of lookahead via [`Lexer::peek`]. The parser drives
//! it on demand; nothing past the lookahead token is ever scanned. Key
//! design decisions:
//!
//! - **Line breaks are tokens.** Husk declarations are line-oriented, so a
//!   maximal run of `\r`/`\n` collapses into one [`TokenKind::Eol`] token
//!   (positioned at its first character) instead of vanishing as
//!   whitespace. Only spaces and tabs are skipped.
//!
//! - **Longest match for operators.** The two-character operators `!!`,
//!   `<=`, `==`, `::`, `->` are tried before their one-character prefixes,
//!   so `::` never lexes as two cons operators.
//!
//! - **`True`/`False` before identifiers.** The keyword check runs ahead of
//!   generic symbol scanning and matches by prefix: `Truex` lexes as `True`
//!   followed by `x`.
//!
//! - **No recovery.** The first unrecognized character (a lone `!` included)
//!   aborts with a lex error at its exact position.

use crate::errors::CompileError;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// Look at the upcoming token without consuming it. Idempotent: repeated
    /// peeks return the same token and scan nothing further.
    pub fn peek(&mut self) -> Result<&Token, CompileError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token()?);
        }
        Ok(self.peeked.as_ref().expect("token was just buffered"))
    }

    /// The kind of the upcoming token. Convenience for lookahead dispatch.
    pub fn peek_kind(&mut self) -> Result<TokenKind, CompileError> {
        Ok(self.peek()?.kind)
    }

    /// Consume and return the next token. Past the end of input this keeps
    /// returning the end-of-file token.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.scan_token(),
        }
    }

    fn scan_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace();
        let line = self.line;
        let column = self.column;

        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        };

        if c == '\r' || c == '\n' {
            return Ok(self.newline_run(line, column));
        }

        // Single-character tokens.
        let single = match c {
            '(' => Some((TokenKind::LParen, "(")),
            ')' => Some((TokenKind::RParen, ")")),
            '[' => Some((TokenKind::LBracket, "[")),
            ']' => Some((TokenKind::RBracket, "]")),
            ',' => Some((TokenKind::Comma, ",")),
            '+' => Some((TokenKind::BinOp, "+")),
            '*' => Some((TokenKind::BinOp, "*")),
            _ => None,
        };
        if let Some((kind, text)) = single {
            self.advance();
            return Ok(Token::new(kind, text, line, column));
        }

        // Two-character operators before their one-character prefixes.
        if c == '!' && self.peek_char_at(1) == Some('!') {
            self.advance();
            self.advance();
            return Ok(Token::new(TokenKind::BinOp, "!!", line, column));
        }
        if c == '<' {
            self.advance();
            let tok = if self.match_char('=') {
                Token::new(TokenKind::BinOp, "<=", line, column)
            } else {
                Token::new(TokenKind::BinOp, "<", line, column)
            };
            return Ok(tok);
        }
        if c == '=' {
            self.advance();
            let tok = if self.match_char('=') {
                Token::new(TokenKind::BinOp, "==", line, column)
            } else {
                Token::new(TokenKind::Eq, "=", line, column)
            };
            return Ok(tok);
        }
        if c == ':' {
            self.advance();
            let tok = if self.match_char(':') {
                Token::new(TokenKind::DoubleColon, "::", line, column)
            } else {
                Token::new(TokenKind::BinOp, ":", line, column)
            };
            return Ok(tok);
        }
        if c == '-' {
            self.advance();
            let tok = if self.match_char('>') {
                Token::new(TokenKind::Arrow, "->", line, column)
            } else {
                Token::new(TokenKind::BinOp, "-", line, column)
            };
            return Ok(tok);
        }

        // Keywords, checked before identifier scanning.
        if self.match_word("True") {
            return Ok(Token::new(TokenKind::BoolLit, "True", line, column));
        }
        if self.match_word("False") {
            return Ok(Token::new(TokenKind::BoolLit, "False", line, column));
        }

        if c.is_ascii_digit() {
            let text = self.scan_while(|c| c.is_ascii_digit());
            return Ok(Token::new(TokenKind::NatLit, text, line, column));
        }

        if c.is_ascii_alphanumeric() {
            let text = self.scan_while(|c| c.is_ascii_alphanumeric());
            return Ok(Token::new(TokenKind::Symbol, text, line, column));
        }

        Err(CompileError::lex(
            "No matching token",
            Span::point(line, column),
        ))
    }

    /// Collapse a maximal run of `\r`/`\n` into one end-of-line token.
    fn newline_run(&mut self, line: u32, column: u32) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => {
                    text.push(c);
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {
                    text.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        Token::new(TokenKind::Eol, text, line, column)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ') | Some('\t')) {
            self.advance();
        }
    }

    // ── Character-level helpers ──────────────────────────────────────

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        self.column += 1;
        c
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    /// Consume `word` if the upcoming characters spell it out. Deliberately
    /// a prefix match, with no word-boundary check after it.
    fn match_word(&mut self, word: &str) -> bool {
        let matched = word
            .chars()
            .enumerate()
            .all(|(i, w)| self.peek_char_at(i) == Some(w));
        if matched {
            for _ in 0..word.chars().count() {
                self.advance();
            }
        }
        matched
    }

    fn scan_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex error");
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    fn lex_texts(source: &str) -> Vec<String> {
        let mut tokens = lex(source);
        tokens.pop(); // drop EOF
        tokens.into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn naturals_and_symbols() {
        assert_eq!(
            lex_kinds("sum 42 x2"),
            vec![
                TokenKind::Symbol,
                TokenKind::NatLit,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
        // Digits win first, so a leading digit splits the word.
        assert_eq!(lex_texts("2x"), vec!["2", "x"]);
    }

    #[test]
    fn operators_longest_match() {
        assert_eq!(
            lex_kinds(":: : -> - <= < == = !!"),
            vec![
                TokenKind::DoubleColon,
                TokenKind::BinOp,
                TokenKind::Arrow,
                TokenKind::BinOp,
                TokenKind::BinOp,
                TokenKind::BinOp,
                TokenKind::BinOp,
                TokenKind::Eq,
                TokenKind::BinOp,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            lex_texts(":: : -> - <= < == = !!"),
            vec!["::", ":", "->", "-", "<=", "<", "==", "=", "!!"]
        );
    }

    #[test]
    fn keywords_match_before_identifiers() {
        assert_eq!(
            lex_kinds("True False"),
            vec![TokenKind::BoolLit, TokenKind::BoolLit, TokenKind::Eof]
        );
        // Prefix match: no word-boundary check after the keyword.
        assert_eq!(lex_texts("Truex"), vec!["True", "x"]);
        assert_eq!(
            lex_kinds("Truex"),
            vec![TokenKind::BoolLit, TokenKind::Symbol, TokenKind::Eof]
        );
    }

    #[test]
    fn newline_runs_collapse_to_one_eol() {
        assert_eq!(
            lex_kinds("a\n\n\nb"),
            vec![
                TokenKind::Symbol,
                TokenKind::Eol,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lex_kinds("a\r\n\r\nb"),
            vec![
                TokenKind::Symbol,
                TokenKind::Eol,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = lex("sum :: Nat\nsum n = n");
        let positions: Vec<(u32, u32)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(
            positions,
            vec![
                (1, 1),  // sum
                (1, 5),  // ::
                (1, 8),  // Nat
                (1, 11), // end of line
                (2, 1),  // sum
                (2, 5),  // n
                (2, 7),  // =
                (2, 9),  // n
                (2, 10), // end of file
            ]
        );
    }

    #[test]
    fn unknown_character_is_a_lex_error() {
        let mut lexer = Lexer::new("a ? b");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.message, "No matching token");
        assert_eq!((err.span.line, err.span.column), (1, 3));
    }

    #[test]
    fn lone_bang_is_a_lex_error() {
        let mut lexer = Lexer::new("!");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn peek_is_idempotent() {
        let mut lexer = Lexer::new("sum 1");
        assert_eq!(lexer.peek().unwrap().text, "sum");
        assert_eq!(lexer.peek().unwrap().text, "sum");
        assert_eq!(lexer.next_token().unwrap().text, "sum");
        assert_eq!(lexer.next_token().unwrap().text, "1");
    }

    #[test]
    fn eof_repeats_after_end_of_input() {
        let mut lexer = Lexer::new("x");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
