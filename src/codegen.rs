//! Code generation — lowers a checked program to TypeScript type
//! definitions.
//!
//! The target is the TypeScript type system used as a term language:
//! naturals are Peano chains `S<S<0>>`, lists are nested pairs
//! `[head, tail]` ending in `[]`, tuples are fixed-length sequences, and
//! the binary operators call the recursive primitives defined once in the
//! prelude that heads every output.
//!
//! A function with parameters becomes a generic type whose body is its
//! clause chain: each clause compiles to
//! `[formals...] extends [patterns...] ? body :` and evaluation falls
//! through to the next clause on a non-match. Repeated-variable
//! constraints compile to extra formal/first-occurrence pairs at the
//! front of the match; pattern variables become `infer` bindings typed by
//! the checked type at that position. The chain ends with the catch-all
//! clause's body, or the signature's return default, or `never` when the
//! match is not covered. Clause order is exactly declaration order —
//! the first structurally matching clause wins.
//!
//! Generation is a pure tree walk: same checked program in, byte-identical
//! text out.

use crate::ast::*;

/// Primitive operations prepended verbatim to every compiled program.
pub const PRELUDE: &str = include_str!("../resources/prelude.ts");

/// Generate the complete output: the prelude followed by one type
/// definition per signature, in declaration order.
pub fn generate(program: &Program) -> String {
    let mut out = String::from(PRELUDE);
    for def in &program.defs {
        out.push_str(&gen_def(program, def));
    }
    out
}

fn gen_def(program: &Program, def: &FuncDef) -> String {
    let mut code = format!("type {}", def.name);

    if !def.params.is_empty() {
        let formals = def
            .param_names
            .iter()
            .zip(&def.params)
            .map(|(name, param)| {
                let mut formal = format!("{} extends {}", name, gen_ty(&param.ty));
                if let Some(default) = &param.default {
                    formal.push_str(&format!(" = {}", gen_expr(default)));
                }
                formal
            })
            .collect::<Vec<_>>()
            .join(", ");
        code.push_str(&format!("<{}>", formals));
    }

    code.push_str(" =\n");
    for clause_id in &def.clauses {
        code.push_str(&format!("\t{}\n", gen_clause(program, program.body(*clause_id))));
    }

    // After the last clause: the catch-all body, the signature's return
    // default, or an uncovered match.
    code.push('\t');
    if let Some(default_id) = def.default_clause {
        code.push_str(&gen_clause(program, program.body(default_id)));
    } else if let Some(default) = &def.default_value {
        code.push_str(&gen_expr(default));
    } else {
        code.push_str("never");
    }
    code.push_str(";\n\n");
    code
}

/// One clause: `[formals] extends [patterns] ? body :`, or the bare body
/// when there is nothing to match (the catch-all case).
fn gen_clause(program: &Program, body: &FuncBody) -> String {
    let def = program.def(body.def.expect("clauses are resolved before code generation"));

    let mut formals = Vec::new();
    let mut patterns = Vec::new();

    // Equality constraints first: every occurrence after the first must
    // match whatever the first occurrence's formal captured.
    for repeated in &body.repeated {
        let first = repeated.positions[0];
        for position in &repeated.positions[1..] {
            formals.push(def.param_names[*position].clone());
            patterns.push(def.param_names[first].clone());
        }
    }

    for (i, param) in body.params.iter().enumerate() {
        if let ClauseParam::Pattern(pattern) = param {
            formals.push(def.param_names[i].clone());
            patterns.push(gen_expr(&pattern.expr));
        }
    }

    let body_code = gen_expr(&body.body);
    if formals.is_empty() {
        return body_code;
    }
    format!(
        "[{}] extends [{}] ? {} :",
        formals.join(", "),
        patterns.join(", "),
        body_code
    )
}

fn gen_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Nat(n) => gen_nat(*n),
        ExprKind::Bool(true) => "true".to_string(),
        ExprKind::Bool(false) => "false".to_string(),
        ExprKind::List(values) => {
            let mut code = String::from("[]");
            for value in values.iter().rev() {
                code = format!("[{}, {}]", gen_expr(value), code);
            }
            code
        }
        ExprKind::Tuple(values) => {
            let values = values.iter().map(gen_expr).collect::<Vec<_>>().join(", ");
            format!("[{}]", values)
        }
        ExprKind::Var {
            name,
            inside_pattern,
            ..
        } => {
            if *inside_pattern {
                let ty = expr
                    .ty
                    .as_ref()
                    .expect("expressions are typed before code generation");
                format!("infer {} extends {}", name, gen_ty(ty))
            } else {
                name.clone()
            }
        }
        ExprKind::Binary { op, left, right } => {
            let left = gen_expr(left);
            let right = gen_expr(right);
            if *op == BinOp::Cons {
                return format!("[{}, {}]", left, right);
            }
            format!("{}<{}, {}>", prim_name(*op), left, right)
        }
        ExprKind::Call { name, args, .. } => {
            let args = args.iter().map(gen_expr).collect::<Vec<_>>().join(", ");
            format!("{}<{}>", name, args)
        }
    }
}

/// The prelude type implementing a binary operator.
fn prim_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Index => "ListGet",
        BinOp::Add => "Add",
        BinOp::Sub => "Sub",
        BinOp::Mul => "Mul",
        BinOp::Lt => "Lt",
        BinOp::Lte => "Lte",
        BinOp::Eq => "Eq",
        BinOp::Cons => unreachable!("cons lowers to a pair, not a primitive"),
    }
}

fn gen_nat(n: u64) -> String {
    let n = n as usize;
    format!("{}0{}", "S<".repeat(n), ">".repeat(n))
}

fn gen_ty(ty: &Ty) -> String {
    if ty.is_tuple() {
        return format!("[{}]", gen_ty_params(&ty.params));
    }
    if ty.params.is_empty() {
        return ty.name.clone();
    }
    format!("{}<{}>", ty.name, gen_ty_params(&ty.params))
}

fn gen_ty_params(params: &[Ty]) -> String {
    params.iter().map(gen_ty).collect::<Vec<_>>().join(", ")
}
