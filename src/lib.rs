//! Husk Compiler — compiles the Husk language to TypeScript types.
//!
//! Husk is a tiny total functional language: naturals, booleans, lists and
//! tuples, with multi-clause pattern-matching function definitions. The
//! compiler targets the TypeScript *type system* — the generated program
//! is a set of type definitions whose normalization by a TypeScript
//! checker evaluates the program.
//!
//! # Compiler Pipeline
//!
//! ```text
//! Source Code (.husk)
//!     │
//!     ▼
//! ┌──────────┐
//! │  Lexer    │  Tokenizes source into a lazy stream with line/column spans
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │  Parser   │  Recursive descent, one-token lookahead, signatures + clauses
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │ Resolve   │  Names: clause→signature links, parameter naming, call arity
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │  Types    │  Bidirectional checking against the declared signatures
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │ Codegen   │  Prelude + one TypeScript type per function (.ts)
//! └────┬─────┘
//!      │
//!      ▼
//! TypeScript types (.ts)
//! ```
//!
//! The pipeline is fail-fast: the first error anywhere aborts the
//! compilation and is reported once, with its source span. Each call to
//! [`try_compile`] builds fresh state, so independent compilations are
//! free to run on separate threads.

pub mod ast;
pub mod codegen;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod token;
pub mod types;

use errors::CompileError;
use lexer::Lexer;
use parser::Parser;

/// Compile Husk source text to TypeScript type definitions.
///
/// On success the output is the prelude followed by one definition per
/// declared function, in declaration order; on failure the first error
/// encountered is returned and no output is produced.
pub fn try_compile(source: &str) -> Result<String, CompileError> {
    let mut program = Parser::new(Lexer::new(source)).parse()?;
    resolve::resolve(&mut program)?;
    types::check(&mut program)?;
    Ok(codegen::generate(&program))
}

/// Compile Husk source text, reporting any error to `on_error`.
///
/// Returns the generated output, or an empty string after an error. This
/// is the callback-style entry point; use [`try_compile`] to handle the
/// error as a value instead.
pub fn compile(source: &str, on_error: impl FnOnce(&CompileError)) -> String {
    match try_compile(source) {
        Ok(output) => output,
        Err(err) => {
            on_error(&err);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ErrorKind;
    use token::Span;

    #[test]
    fn sum_program_compiles_end_to_end() {
        let source = "sum :: Nat -> Nat\n\
                      sum 0 = 0\n\
                      sum n = n + sum(n - 1)\n\
                      \n\
                      main :: Nat\n\
                      main = sum 4\n";
        let output = try_compile(source).expect("compile error");
        assert!(output.starts_with(codegen::PRELUDE));
        assert!(output.contains("type sum<n extends Nat> =\n"));
        assert!(output.ends_with("type main =\n\tsum<S<S<S<S<0>>>>>;\n\n"));
    }

    #[test]
    fn identity_program_compiles() {
        let source = "identity :: Bool -> Bool\n\
                      identity b = b\n\
                      main :: Bool\n\
                      main = identity True\n";
        let output = try_compile(source).expect("compile error");
        assert!(output.contains("type identity<b extends Bool> =\n\tb;\n\n"));
        assert!(output.ends_with("type main =\n\tidentity<true>;\n\n"));
    }

    #[test]
    fn repeated_variable_program_compiles() {
        let source = "same :: Nat -> Nat -> Bool\n\
                      same x x = True\n\
                      same x y = False\n\
                      main :: Bool\n\
                      main = same 3 3\n";
        let output = try_compile(source).expect("compile error");
        assert!(output.contains(
            "type same<x extends Nat, y extends Nat> =\n\t[y] extends [x] ? true :\n\tfalse;\n\n"
        ));
        assert!(output.ends_with("type main =\n\tsame<S<S<S<0>>>, S<S<S<0>>>>;\n\n"));
    }

    #[test]
    fn list_literal_program_compiles() {
        let source = "main :: [Nat]\nmain = [1, 2, 3]\n";
        let output = try_compile(source).expect("compile error");
        assert!(output.ends_with("type main =\n\t[S<0>, [S<S<0>>, [S<S<S<0>>>, []]]];\n\n"));
    }

    #[test]
    fn undeclared_call_reports_a_name_error_at_the_call_site() {
        let err = try_compile("main :: Nat\nmain = missingFn 1").expect_err("expected an error");
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.message, "Function missingFn not declared");
        assert_eq!(err.span, Span::new(2, 8, 2, 19));
    }

    #[test]
    fn each_stage_reports_its_own_error_kind() {
        let lex = try_compile("main = ?").expect_err("expected an error");
        assert_eq!(lex.kind, ErrorKind::Lex);
        let parse = try_compile("main = [1 2]").expect_err("expected an error");
        assert_eq!(parse.kind, ErrorKind::Parse);
        let name = try_compile("main = 1").expect_err("expected an error");
        assert_eq!(name.kind, ErrorKind::Name);
        let ty = try_compile("main :: Bool\nmain = 1").expect_err("expected an error");
        assert_eq!(ty.kind, ErrorKind::Type);
    }

    #[test]
    fn compile_reports_through_the_callback_and_returns_empty() {
        let mut reported = None;
        let output = compile("main = ?", |err| reported = Some(err.clone()));
        assert_eq!(output, "");
        let err = reported.expect("callback not called");
        assert_eq!(err.kind, ErrorKind::Lex);

        let output = compile("main :: Nat\nmain = 2", |_| panic!("unexpected error"));
        assert!(output.ends_with("type main =\n\tS<S<0>>;\n\n"));
    }
}
