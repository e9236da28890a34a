//! Rich error reporting with source spans.
//!
//! Every pipeline stage reports failure through [`CompileError`], a plain
//! `{kind, message, span}` value in 1-based line/column coordinates — the
//! shape callers embedding the compiler consume directly. For terminal
//! output, [`CompileError::into_report`] attaches the source text and
//! converts the span to byte offsets so miette can render code context and
//! underlines.

use crate::token::Span;
use miette::{Diagnostic, SourceSpan};
use std::fmt;
use thiserror::Error;

/// Which pipeline stage rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Name,
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lex => write!(f, "Lex"),
            ErrorKind::Parse => write!(f, "Parse"),
            ErrorKind::Name => write!(f, "Name"),
            ErrorKind::Type => write!(f, "Type"),
        }
    }
}

/// A compile error with source location information.
///
/// At most one is produced per compilation: the pipeline is fail-fast and
/// performs no recovery or multi-error collection.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} error at {span}: {message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lex, message, span)
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Parse, message, span)
    }

    pub fn name(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Name, message, span)
    }

    pub fn ty(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Attach source text, producing a diagnostic miette can render with
    /// code context and an underline under the offending span.
    pub fn into_report(self, source: &str) -> Report {
        let start = offset_of(source, self.span.line, self.span.column);
        let end = offset_of(source, self.span.end_line, self.span.end_column);
        let len = end.saturating_sub(start).max(1);
        Report {
            message: self.message,
            src: source.to_string(),
            span: (start, len).into(),
            label: format!("{} error here", self.kind),
        }
    }
}

/// A compile error bundled with its source, ready for terminal rendering.
#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
pub struct Report {
    pub message: String,

    #[source_code]
    pub src: String,

    #[label("{label}")]
    pub span: SourceSpan,

    pub label: String,
}

/// Byte offset of a 1-based (line, column) position in `source`.
///
/// Positions past the end of a line or of the text clamp to the nearest
/// valid offset, so a span pointing at end-of-file still renders.
fn offset_of(source: &str, line: u32, column: u32) -> usize {
    let mut cur_line = 1;
    let mut cur_column = 1;
    for (i, c) in source.char_indices() {
        if cur_line == line && cur_column == column {
            return i;
        }
        if cur_line > line {
            return i;
        }
        if c == '\n' {
            cur_line += 1;
            cur_column = 1;
        } else {
            cur_column += 1;
        }
    }
    source.len()
}
