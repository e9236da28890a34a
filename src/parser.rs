//! Parser — recursive descent over the lazy token stream.
//!
//! The parser pulls tokens from the lexer on demand and never needs more
//! than one token of lookahead. Husk's grammar is line-oriented: every
//! non-blank line is either a signature or a clause, and one peek after the
//! leading identifier decides which — `::` means signature, anything else
//! means clause.
//!
//! Two properties make expressions unusual:
//!
//! - **No precedence.** A binary operator consumes the entire rest of the
//!   expression as its right operand, so every chain associates to the
//!   right: `a - b - c` parses as `a - (b - c)`, and `a + b : c` parses as
//!   `a + (b : c)`. Parentheses are the only way to regroup.
//!
//! - **Juxtaposition is application.** A bare identifier becomes a call
//!   when the very next token can begin an argument (`f x 1`). Arguments
//!   are atoms; a nested call needs parentheses (`f (g x)`).
//!
//! There is no error recovery: the first syntax error aborts the parse with
//! an error at the offending token's span.

use crate::ast::*;
use crate::errors::CompileError;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Self { lexer }
    }

    /// Parse a complete program: any number of signatures and clauses
    /// separated by line breaks.
    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let mut program = Program::default();
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Eol => continue,
                TokenKind::Symbol => {
                    if self.lexer.peek_kind()? == TokenKind::DoubleColon {
                        program.defs.push(self.signature(tok)?);
                    } else {
                        program.bodies.push(self.clause(tok)?);
                    }
                }
                _ => return Err(self.unexpected(&tok)),
            }
        }
        Ok(program)
    }

    // ── Signatures ───────────────────────────────────────────────────

    /// `name :: T1 [= d1] -> T2 [= d2] -> ... -> R [= dR]`
    ///
    /// Everything left of the last arrow is a parameter slot; the final
    /// type is the return type. A default on the return type becomes the
    /// function's catch-all body.
    fn signature(&mut self, name_tok: Token) -> Result<FuncDef, CompileError> {
        self.expect(TokenKind::DoubleColon)?;
        let mut slots: Vec<Param> = Vec::new();
        let ret = loop {
            let slot = self.param_slot()?;
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Arrow => slots.push(slot),
                TokenKind::Eol | TokenKind::Eof => break slot,
                _ => {
                    return Err(CompileError::parse(
                        format!("Expected '->' or end of line, found {}", tok.kind),
                        tok.span(),
                    ))
                }
            }
        };

        let span = name_tok.span().merge(ret.span);
        let param_names = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| format!("{}{}", slot.ty.name.to_lowercase(), i))
            .collect();
        let user_named = vec![None; slots.len()];
        Ok(FuncDef {
            name: name_tok.text,
            params: slots,
            return_type: ret.ty,
            default_value: ret.default,
            param_names,
            user_named,
            clauses: Vec::new(),
            default_clause: None,
            span,
        })
    }

    /// One `Type [= default]` slot of a signature.
    fn param_slot(&mut self) -> Result<Param, CompileError> {
        let (ty, span) = self.ty()?;
        if self.lexer.peek_kind()? == TokenKind::Eq {
            self.lexer.next_token()?;
            let default = self.expr()?;
            let span = span.merge(default.span);
            return Ok(Param {
                ty,
                default: Some(default),
                span,
            });
        }
        Ok(Param {
            ty,
            default: None,
            span,
        })
    }

    // ── Types ────────────────────────────────────────────────────────

    /// A full type: `[T]`, `(T1, T2)`, `(T,)`, or `Name arg1 arg2`.
    fn ty(&mut self) -> Result<(Ty, Span), CompileError> {
        let tok = self.lexer.next_token()?;
        match tok.kind {
            TokenKind::LBracket => self.list_ty(&tok),
            TokenKind::LParen => self.paren_ty(&tok),
            TokenKind::Symbol => {
                let mut span = tok.span();
                let mut params = Vec::new();
                // Juxtaposition is application here too: `Pair Nat Bool`.
                // Stop at any token that can't begin a type argument.
                while !matches!(
                    self.lexer.peek_kind()?,
                    TokenKind::RBracket
                        | TokenKind::RParen
                        | TokenKind::Comma
                        | TokenKind::Eq
                        | TokenKind::Arrow
                        | TokenKind::Eol
                        | TokenKind::Eof
                ) {
                    let (param, param_span) = self.ty_arg()?;
                    span = span.merge(param_span);
                    params.push(param);
                }
                Ok((
                    Ty {
                        name: tok.text,
                        params,
                    },
                    span,
                ))
            }
            _ => Err(self.unexpected(&tok)),
        }
    }

    /// `[T]`, the list type.
    fn list_ty(&mut self, open: &Token) -> Result<(Ty, Span), CompileError> {
        let (element, _) = self.ty()?;
        let close = self.expect(TokenKind::RBracket)?;
        Ok((Ty::list(element), open.span().merge(close.span())))
    }

    /// Parenthesized type: grouping, or a tuple when a comma follows the
    /// first element. `(T,)` is a one-element tuple.
    fn paren_ty(&mut self, open: &Token) -> Result<(Ty, Span), CompileError> {
        let (first, _) = self.ty()?;
        let tok = self.lexer.next_token()?;
        if tok.kind != TokenKind::Comma {
            self.must_match(&tok, TokenKind::RParen)?;
            return Ok((first, open.span().merge(tok.span())));
        }
        let mut elements = vec![first];
        if self.lexer.peek_kind()? == TokenKind::RParen {
            let close = self.lexer.next_token()?;
            return Ok((Ty::tuple(elements), open.span().merge(close.span())));
        }
        loop {
            elements.push(self.ty()?.0);
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Comma => continue,
                _ => {
                    self.must_match(&tok, TokenKind::RParen)?;
                    return Ok((Ty::tuple(elements), open.span().merge(tok.span())));
                }
            }
        }
    }

    /// A type argument. Like [`Parser::ty`], except a bare name takes no
    /// further arguments: in `Triple (Pair Nat Bool) Nat` the inner
    /// application needs its parentheses.
    fn ty_arg(&mut self) -> Result<(Ty, Span), CompileError> {
        let tok = self.lexer.next_token()?;
        match tok.kind {
            TokenKind::LBracket => self.list_ty(&tok),
            TokenKind::LParen => self.paren_ty(&tok),
            TokenKind::Symbol => {
                let span = tok.span();
                Ok((Ty::named(tok.text), span))
            }
            _ => Err(self.unexpected(&tok)),
        }
    }

    // ── Clauses ──────────────────────────────────────────────────────

    /// `name p1 p2 ... pk = body`
    fn clause(&mut self, name_tok: Token) -> Result<FuncBody, CompileError> {
        let mut params = Vec::new();
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Eq => break,
                TokenKind::Symbol => {
                    let span = tok.span();
                    params.push(ClauseParam::Var(VarSlot {
                        name: tok.text,
                        span,
                    }));
                }
                TokenKind::NatLit => {
                    let expr = Self::nat_expr(&tok)?;
                    params.push(ClauseParam::Pattern(Pattern {
                        span: expr.span,
                        expr,
                    }));
                }
                TokenKind::BoolLit => {
                    let expr = Self::bool_expr(&tok);
                    params.push(ClauseParam::Pattern(Pattern {
                        span: expr.span,
                        expr,
                    }));
                }
                TokenKind::LBracket => {
                    let expr = self.list_lit(&tok)?;
                    params.push(ClauseParam::Pattern(Pattern {
                        span: expr.span,
                        expr,
                    }));
                }
                TokenKind::LParen => {
                    let expr = self.paren_expr(&tok)?;
                    params.push(ClauseParam::Pattern(Pattern {
                        span: expr.span,
                        expr,
                    }));
                }
                _ => return Err(self.unexpected(&tok)),
            }
        }

        let body = self.expr()?;
        let tok = self.lexer.next_token()?;
        if tok.kind != TokenKind::Eol && tok.kind != TokenKind::Eof {
            return Err(CompileError::parse(
                format!("Expected end of line, found {}", tok.kind),
                tok.span(),
            ));
        }

        let span = name_tok.span().merge(body.span);
        Ok(FuncBody {
            name: name_tok.text,
            params,
            body,
            def: None,
            repeated: Vec::new(),
            span,
        })
    }

    // ── Expressions ──────────────────────────────────────────────────

    /// Any expression, including a trailing right-associative operator
    /// chain.
    fn expr(&mut self) -> Result<Expr, CompileError> {
        let tok = self.lexer.next_token()?;
        let first = match tok.kind {
            TokenKind::NatLit => Self::nat_expr(&tok)?,
            TokenKind::BoolLit => Self::bool_expr(&tok),
            TokenKind::LBracket => self.list_lit(&tok)?,
            TokenKind::LParen => self.paren_expr(&tok)?,
            TokenKind::Symbol => {
                if Self::starts_argument(self.lexer.peek_kind()?) {
                    self.call(&tok)?
                } else {
                    Self::var_expr(&tok)
                }
            }
            _ => return Err(self.unexpected(&tok)),
        };

        if self.lexer.peek_kind()? == TokenKind::BinOp {
            let op_tok = self.lexer.next_token()?;
            let op = BinOp::from_text(&op_tok.text);
            let right = self.expr()?;
            let span = first.span.merge(right.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(first),
                    right: Box::new(right),
                },
                span,
            ));
        }
        Ok(first)
    }

    /// Whether a token of this kind can begin a call argument. Everything
    /// else ends an argument list: operators, separators, terminators,
    /// closing delimiters.
    fn starts_argument(kind: TokenKind) -> bool {
        !matches!(
            kind,
            TokenKind::BinOp
                | TokenKind::Comma
                | TokenKind::Eol
                | TokenKind::Eof
                | TokenKind::RParen
                | TokenKind::RBracket
        )
    }

    /// `f a1 a2 ...` — arguments are atoms, parsed until a stop token.
    fn call(&mut self, name_tok: &Token) -> Result<Expr, CompileError> {
        let mut span = name_tok.span();
        let mut args = Vec::new();
        while Self::starts_argument(self.lexer.peek_kind()?) {
            let arg = self.arg()?;
            span = span.merge(arg.span);
            args.push(arg);
        }
        Ok(Expr::new(
            ExprKind::Call {
                name: name_tok.text.clone(),
                args,
                def: None,
            },
            span,
        ))
    }

    /// A single call argument: a literal, a variable, or a
    /// bracketed/parenthesized form. A bare identifier here stays a
    /// variable; nested calls need parentheses.
    fn arg(&mut self) -> Result<Expr, CompileError> {
        let tok = self.lexer.next_token()?;
        match tok.kind {
            TokenKind::NatLit => Self::nat_expr(&tok),
            TokenKind::BoolLit => Ok(Self::bool_expr(&tok)),
            TokenKind::LBracket => self.list_lit(&tok),
            TokenKind::LParen => self.paren_expr(&tok),
            TokenKind::Symbol => Ok(Self::var_expr(&tok)),
            _ => Err(self.unexpected(&tok)),
        }
    }

    /// Bracketed list literal: full expressions separated by commas, with
    /// an optional trailing comma. `[]` is empty.
    fn list_lit(&mut self, open: &Token) -> Result<Expr, CompileError> {
        if self.lexer.peek_kind()? == TokenKind::RBracket {
            let close = self.lexer.next_token()?;
            return Ok(Expr::new(
                ExprKind::List(Vec::new()),
                open.span().merge(close.span()),
            ));
        }
        let mut values = Vec::new();
        let close = loop {
            values.push(self.expr()?);
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::RBracket => break tok,
                TokenKind::Comma => {
                    if self.lexer.peek_kind()? == TokenKind::RBracket {
                        break self.lexer.next_token()?;
                    }
                }
                _ => {
                    return Err(CompileError::parse(
                        format!("Expected ',' or ']', found {}", tok.kind),
                        tok.span(),
                    ))
                }
            }
        };
        Ok(Expr::new(
            ExprKind::List(values),
            open.span().merge(close.span()),
        ))
    }

    /// Parenthesized expression: grouping, or a tuple literal when a comma
    /// follows the first element.
    fn paren_expr(&mut self, open: &Token) -> Result<Expr, CompileError> {
        let first = self.expr()?;
        let tok = self.lexer.next_token()?;
        if tok.kind == TokenKind::Comma {
            return self.tuple_lit(open, first);
        }
        self.must_match(&tok, TokenKind::RParen)?;
        let mut expr = first;
        expr.span = open.span().merge(tok.span());
        Ok(expr)
    }

    /// `(first, rest...)` — the comma after `first` is already consumed.
    /// `(e,)` is a one-element tuple.
    fn tuple_lit(&mut self, open: &Token, first: Expr) -> Result<Expr, CompileError> {
        if self.lexer.peek_kind()? == TokenKind::RParen {
            let close = self.lexer.next_token()?;
            return Ok(Expr::new(
                ExprKind::Tuple(vec![first]),
                open.span().merge(close.span()),
            ));
        }
        let mut values = vec![first, self.expr()?];
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Comma => values.push(self.expr()?),
                _ => {
                    self.must_match(&tok, TokenKind::RParen)?;
                    return Ok(Expr::new(
                        ExprKind::Tuple(values),
                        open.span().merge(tok.span()),
                    ));
                }
            }
        }
    }

    fn nat_expr(tok: &Token) -> Result<Expr, CompileError> {
        let value: u64 = tok.text.parse().map_err(|_| {
            CompileError::parse(
                format!("Natural literal '{}' is too large", tok.text),
                tok.span(),
            )
        })?;
        Ok(Expr::new(ExprKind::Nat(value), tok.span()))
    }

    fn bool_expr(tok: &Token) -> Expr {
        Expr::new(ExprKind::Bool(tok.text == "True"), tok.span())
    }

    fn var_expr(tok: &Token) -> Expr {
        Expr::new(
            ExprKind::Var {
                name: tok.text.clone(),
                scope: None,
                inside_pattern: false,
            },
            tok.span(),
        )
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        let tok = self.lexer.next_token()?;
        self.must_match(&tok, kind)?;
        Ok(tok)
    }

    fn must_match(&self, tok: &Token, kind: TokenKind) -> Result<(), CompileError> {
        if tok.kind != kind {
            return Err(CompileError::parse(
                format!("Expected {}, found {}", kind, tok.kind),
                tok.span(),
            ));
        }
        Ok(())
    }

    fn unexpected(&self, tok: &Token) -> CompileError {
        CompileError::parse(format!("Unexpected {}", tok.kind), tok.span())
    }
}
