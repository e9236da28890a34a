//! Type checking — bidirectional, expected-type-driven.
//!
//! Husk signatures declare every type up front, so the checker never
//! infers: it pushes an expected type down into every expression and
//! verifies the shape it finds there. The only bottom-up information is
//! the symbol table: the first time a variable is seen it is recorded at
//! the expected type, and every later sighting under the same scope must
//! match exactly. There is no generalization, no subtyping, and no
//! coercion — equality of [`Ty`] is structural, nothing else.
//!
//! Checking runs in three steps over a resolved [`Program`]:
//!
//! 1. Parameterless signatures are named constants; their declared types
//!    seed the symbol table under a top-level key, so every bare use must
//!    agree with the declaration.
//! 2. Signature defaults are validated: each must be a constant
//!    expression, checked against its own slot's declared type.
//! 3. Every clause is checked: variable slots bind at their position's
//!    declared type, patterns are checked against it, and the body is
//!    checked against the declared return type.
//!
//! On success every expression carries its resolved [`Ty`]; the first
//! mismatch aborts with a Type error at the offending span.

use crate::ast::*;
use crate::errors::CompileError;
use crate::token::Span;
use std::collections::HashMap;

/// Memoized variable types, keyed by scope and name. `None` scope is the
/// top level, where parameterless functions live.
type SymbolTable = HashMap<(Option<FuncId>, String), Ty>;

/// Check the whole program. Requires name resolution to have run.
pub fn check(program: &mut Program) -> Result<(), CompileError> {
    let mut symbols: SymbolTable = HashMap::new();

    for def in &program.defs {
        if def.params.is_empty() {
            symbols.insert((None, def.name.clone()), def.return_type.clone());
        }
    }

    // Defaults are checked detached from their signature so the signature
    // table stays borrowable for callee lookups.
    for i in 0..program.defs.len() {
        for j in 0..program.defs[i].params.len() {
            if let Some(mut default) = program.defs[i].params[j].default.take() {
                check_constant(
                    &mut default,
                    &program.defs[i].params[j].ty,
                    &mut symbols,
                    &program.defs,
                )?;
                program.defs[i].params[j].default = Some(default);
            }
        }
        if let Some(mut default) = program.defs[i].default_value.take() {
            check_constant(
                &mut default,
                &program.defs[i].return_type,
                &mut symbols,
                &program.defs,
            )?;
            program.defs[i].default_value = Some(default);
        }
    }

    let Program { defs, bodies } = program;
    for body in bodies.iter_mut() {
        let def_id = body.def.expect("clauses are resolved before type checking");
        let def = &defs[def_id.0];
        for (i, param) in body.params.iter_mut().enumerate() {
            match param {
                ClauseParam::Var(slot) => bind_symbol(
                    &mut symbols,
                    (Some(def_id), slot.name.clone()),
                    &def.params[i].ty,
                    slot.span,
                )?,
                ClauseParam::Pattern(pattern) => {
                    check_expr(&mut pattern.expr, &def.params[i].ty, &mut symbols, defs)?
                }
            }
        }
        check_expr(&mut body.body, &def.return_type, &mut symbols, defs)?;
    }
    Ok(())
}

/// A signature default: must be a constant expression, then checks like
/// any other expression.
fn check_constant(
    expr: &mut Expr,
    expected: &Ty,
    symbols: &mut SymbolTable,
    defs: &[FuncDef],
) -> Result<(), CompileError> {
    if !expr.is_constant() {
        return Err(CompileError::ty(
            "Default value must be a constant expression",
            expr.span,
        ));
    }
    check_expr(expr, expected, symbols, defs)
}

/// Record a variable at `expected`, or verify it matches the type already
/// on record for the same scoped name.
fn bind_symbol(
    symbols: &mut SymbolTable,
    key: (Option<FuncId>, String),
    expected: &Ty,
    span: Span,
) -> Result<(), CompileError> {
    if let Some(existing) = symbols.get(&key) {
        if existing != expected {
            return Err(CompileError::ty(
                format!(
                    "Expected {}, but symbol {} has type {}",
                    expected, key.1, existing
                ),
                span,
            ));
        }
        return Ok(());
    }
    symbols.insert(key, expected.clone());
    Ok(())
}

/// Check one expression against the type its context demands, and stamp
/// that type onto the node.
fn check_expr(
    expr: &mut Expr,
    expected: &Ty,
    symbols: &mut SymbolTable,
    defs: &[FuncDef],
) -> Result<(), CompileError> {
    let span = expr.span;
    match &mut expr.kind {
        ExprKind::Nat(_) => {
            if *expected != Ty::nat() {
                return Err(CompileError::ty(
                    format!("Expected {}, found natural literal", expected),
                    span,
                ));
            }
        }
        ExprKind::Bool(_) => {
            if *expected != Ty::bool() {
                return Err(CompileError::ty(
                    format!("Expected {}, found boolean literal", expected),
                    span,
                ));
            }
        }
        ExprKind::List(values) => {
            if !expected.is_list() {
                return Err(CompileError::ty(
                    format!("Expected {}, found list literal", expected),
                    span,
                ));
            }
            for value in values {
                check_expr(value, &expected.params[0], symbols, defs)?;
            }
        }
        ExprKind::Tuple(values) => {
            if !expected.is_tuple() {
                return Err(CompileError::ty(
                    format!("Expected {}, found tuple literal", expected),
                    span,
                ));
            }
            if expected.params.len() != values.len() {
                return Err(CompileError::ty(
                    format!("Expected {}, found {}-tuple literal", expected, values.len()),
                    span,
                ));
            }
            for (value, ty) in values.iter_mut().zip(&expected.params) {
                check_expr(value, ty, symbols, defs)?;
            }
        }
        ExprKind::Var { name, scope, .. } => {
            bind_symbol(symbols, (*scope, name.clone()), expected, span)?;
        }
        ExprKind::Binary { op, left, right } => match op {
            BinOp::Cons => {
                if !expected.is_list() {
                    return Err(CompileError::ty(
                        format!("Expected {}, found list constructor", expected),
                        span,
                    ));
                }
                check_expr(left, &expected.params[0], symbols, defs)?;
                check_expr(right, expected, symbols, defs)?;
            }
            BinOp::Index => {
                check_expr(left, &Ty::list(expected.clone()), symbols, defs)?;
                check_expr(right, &Ty::nat(), symbols, defs)?;
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                if *expected != Ty::nat() {
                    return Err(CompileError::ty(
                        format!("Expected {}, found arithmetic operation returning Nat", expected),
                        span,
                    ));
                }
                check_expr(left, expected, symbols, defs)?;
                check_expr(right, expected, symbols, defs)?;
            }
            BinOp::Lt | BinOp::Lte | BinOp::Eq => {
                if *expected != Ty::bool() {
                    return Err(CompileError::ty(
                        format!("Expected {}, found comparison returning Bool", expected),
                        span,
                    ));
                }
                check_expr(left, &Ty::nat(), symbols, defs)?;
                check_expr(right, &Ty::nat(), symbols, defs)?;
            }
        },
        ExprKind::Call { name, args, def } => {
            let callee_id = def.expect("calls are resolved before type checking");
            let callee = &defs[callee_id.0];
            if callee.return_type != *expected {
                return Err(CompileError::ty(
                    format!(
                        "Expected {}, found call to {} returning {}",
                        expected, name, callee.return_type
                    ),
                    span,
                ));
            }
            for (arg, param) in args.iter_mut().zip(&callee.params) {
                check_expr(arg, &param.ty, symbols, defs)?;
            }
        }
    }
    expr.ty = Some(expected.clone());
    Ok(())
}
