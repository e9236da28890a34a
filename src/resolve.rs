//! Identification — binds every name in the program.
//!
//! Two passes over the parsed tree. The first registers every signature in
//! a name table. The second walks each clause in declaration order: it
//! links the clause to its signature, classifies the parameter slots (a
//! variable used once names its position; a variable used at several
//! positions becomes an equality constraint between them), promotes a
//! clause whose slots are all distinct variables to the function's
//! catch-all, and annotates every expression with what its names refer to.
//!
//! Parameter naming is cumulative across clauses: `fib 0 = 0` leaves the
//! position unnamed, and a later `fib n = ...` names it `n` for the whole
//! function. Because of that, repeated-variable constraints can only be
//! validated once every clause has been seen; [`resolve`] runs that check
//! last, program-wide.

use crate::ast::*;
use crate::errors::CompileError;
use std::collections::HashMap;

/// Resolve all names in `program`, linking clauses and calls to their
/// signatures and classifying every variable reference. Fails with a Name
/// error on the first unresolved or conflicting name.
pub fn resolve(program: &mut Program) -> Result<(), CompileError> {
    let mut funcs = HashMap::new();
    for (i, def) in program.defs.iter().enumerate() {
        if funcs.insert(def.name.clone(), FuncId(i)).is_some() {
            return Err(CompileError::name(
                format!("Function {} already declared", def.name),
                def.span,
            ));
        }
    }

    let Program { defs, bodies } = program;
    for (i, body) in bodies.iter_mut().enumerate() {
        resolve_clause(defs, &funcs, body, BodyId(i))?;
    }

    check_repeated(defs, bodies)
}

/// Bind one clause to its signature and classify its parameter slots.
fn resolve_clause(
    defs: &mut [FuncDef],
    funcs: &HashMap<String, FuncId>,
    body: &mut FuncBody,
    id: BodyId,
) -> Result<(), CompileError> {
    let func_id = match funcs.get(&body.name) {
        Some(func_id) => *func_id,
        None => {
            return Err(CompileError::name(
                format!("Function {} not declared", body.name),
                body.span,
            ))
        }
    };
    body.def = Some(func_id);

    let declared = defs[func_id.0].params.len();
    if body.params.len() != declared {
        return Err(CompileError::name(
            format!(
                "Clause of {} has {} parameters, expected {}",
                body.name,
                body.params.len(),
                declared
            ),
            body.span,
        ));
    }

    // Group the bare-variable slots by name, in first-occurrence order.
    let mut names: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, param) in body.params.iter().enumerate() {
        if let ClauseParam::Var(slot) = param {
            match names.iter_mut().find(|(name, _)| *name == slot.name) {
                Some((_, positions)) => positions.push(i),
                None => names.push((slot.name.clone(), vec![i])),
            }
        }
    }

    let distinct = names.len();
    for (name, positions) in names {
        if positions.len() > 1 {
            body.repeated.push(RepeatedVar { name, positions });
            continue;
        }

        // A single occurrence names its position, subject to the naming
        // invariants: a position is named at most once, and no two
        // positions may share a name.
        let idx = positions[0];
        let span = body.params[idx].span();
        let def = &mut defs[func_id.0];
        if let Some(current) = &def.user_named[idx] {
            if *current != name {
                return Err(CompileError::name(
                    format!("Renaming of parameter {}", current),
                    span,
                ));
            }
        }
        for (other_idx, other) in def.user_named.iter().enumerate() {
            if other_idx != idx && other.as_deref() == Some(name.as_str()) {
                return Err(CompileError::name(
                    format!("Parameter name {} already in use", name),
                    span,
                ));
            }
        }
        def.user_named[idx] = Some(name.clone());
        def.param_names[idx] = name;
    }

    // Every slot a distinct variable: nothing to match against, so this
    // clause is the function's catch-all.
    if distinct == declared {
        let def = &mut defs[func_id.0];
        if def.default_clause.is_some() {
            return Err(CompileError::name(
                format!("Function {} already has a default clause", body.name),
                body.span,
            ));
        }
        def.default_clause = Some(id);
    } else {
        defs[func_id.0].clauses.push(id);
    }

    for param in body.params.iter_mut() {
        if let ClauseParam::Pattern(pattern) = param {
            resolve_expr(&mut pattern.expr, funcs, defs, func_id, true)?;
        }
    }
    resolve_expr(&mut body.body, funcs, defs, func_id, false)
}

/// Annotate one expression tree: link calls to their callees (checking the
/// argument count against the callee's mandatory/total parameter range) and
/// record each variable's scope and whether it is a pattern binding.
fn resolve_expr(
    expr: &mut Expr,
    funcs: &HashMap<String, FuncId>,
    defs: &[FuncDef],
    scope: FuncId,
    inside_pattern: bool,
) -> Result<(), CompileError> {
    let span = expr.span;
    match &mut expr.kind {
        ExprKind::Nat(_) | ExprKind::Bool(_) => {}
        ExprKind::List(values) | ExprKind::Tuple(values) => {
            for value in values {
                resolve_expr(value, funcs, defs, scope, inside_pattern)?;
            }
        }
        ExprKind::Binary { left, right, .. } => {
            resolve_expr(left, funcs, defs, scope, inside_pattern)?;
            resolve_expr(right, funcs, defs, scope, inside_pattern)?;
        }
        ExprKind::Var {
            name,
            scope: var_scope,
            inside_pattern: is_binding,
        } => {
            if defs[scope.0].param_names.iter().any(|p| p == name.as_str()) {
                // A read of one of the enclosing function's parameters.
                *var_scope = Some(scope);
            } else if inside_pattern {
                // A fresh binding introduced by the pattern.
                *var_scope = Some(scope);
                *is_binding = true;
            } else {
                // A parameterless function used bare is a reference to a
                // top-level constant; anything else stays function-scoped
                // for the type checker to track.
                match funcs.get(name.as_str()) {
                    Some(id) if defs[id.0].params.is_empty() => *var_scope = None,
                    _ => *var_scope = Some(scope),
                }
            }
        }
        ExprKind::Call { name, args, def } => {
            let callee = match funcs.get(name.as_str()) {
                Some(callee) => *callee,
                None => {
                    return Err(CompileError::name(
                        format!("Function {} not declared", name),
                        span,
                    ))
                }
            };
            *def = Some(callee);

            let min = defs[callee.0].mandatory_params();
            let max = defs[callee.0].params.len();
            if args.len() < min || args.len() > max {
                let expected = if min == max {
                    max.to_string()
                } else {
                    format!("between {} and {}", min, max)
                };
                return Err(CompileError::name(
                    format!(
                        "Function {} expects {} arguments, got {}",
                        name,
                        expected,
                        args.len()
                    ),
                    span,
                ));
            }
            for arg in args {
                resolve_expr(arg, funcs, defs, scope, inside_pattern)?;
            }
        }
    }
    Ok(())
}

/// Validate every repeated-variable constraint against the final parameter
/// names. Deferred to the end of resolution because a later clause may be
/// the one that names the positions an earlier clause's constraint uses.
fn check_repeated(defs: &[FuncDef], bodies: &[FuncBody]) -> Result<(), CompileError> {
    for def in defs {
        for clause_id in &def.clauses {
            let body = &bodies[clause_id.0];
            for repeated in &body.repeated {
                let span = body.params[repeated.positions[0]].span();
                let declared = def
                    .param_names
                    .iter()
                    .position(|name| *name == repeated.name);
                match declared {
                    None => {
                        return Err(CompileError::name(
                            format!("Parameter {} not declared", repeated.name),
                            span,
                        ))
                    }
                    Some(idx) if !repeated.positions.contains(&idx) => {
                        let positions = repeated
                            .positions
                            .iter()
                            .map(|p| p.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        return Err(CompileError::name(
                            format!(
                                "Name {} doesn't match a parameter in positions {}",
                                repeated.name, positions
                            ),
                            span,
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::token::Span;

    fn resolved(source: &str) -> Program {
        let mut program = Parser::new(Lexer::new(source)).parse().expect("parse error");
        resolve(&mut program).expect("name error");
        program
    }

    fn resolve_err(source: &str) -> CompileError {
        let mut program = Parser::new(Lexer::new(source)).parse().expect("parse error");
        resolve(&mut program).expect_err("expected a name error")
    }

    #[test]
    fn clauses_bind_to_their_signatures() {
        let program = resolved("sum :: Nat -> Nat\nsum 0 = 0\nsum n = n");
        assert_eq!(program.bodies[0].def, Some(FuncId(0)));
        assert_eq!(program.bodies[1].def, Some(FuncId(0)));
        assert_eq!(program.defs[0].clauses, vec![BodyId(0)]);
        assert_eq!(program.defs[0].default_clause, Some(BodyId(1)));
        assert_eq!(program.defs[0].param_names, vec!["n"]);
    }

    #[test]
    fn clause_without_a_signature_is_rejected() {
        let err = resolve_err("sum n = n");
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.message, "Function sum not declared");
    }

    #[test]
    fn duplicate_signature_is_rejected() {
        let err = resolve_err("f :: Nat\nf :: Nat");
        assert_eq!(err.message, "Function f already declared");
    }

    #[test]
    fn clause_arity_must_match_the_signature() {
        let err = resolve_err("f :: Nat -> Nat\nf x y = x");
        assert_eq!(err.message, "Clause of f has 2 parameters, expected 1");
    }

    #[test]
    fn single_variables_name_their_positions() {
        let program = resolved("f :: Nat -> Nat -> Nat\nf a b = a");
        let def = &program.defs[0];
        assert_eq!(def.param_names, vec!["a", "b"]);
        assert_eq!(def.user_named, vec![Some("a".into()), Some("b".into())]);
        assert_eq!(def.default_clause, Some(BodyId(0)));
    }

    #[test]
    fn positions_keep_their_first_name() {
        let err = resolve_err("f :: Nat -> Nat\nf a = a\nf b = b");
        assert_eq!(err.message, "Renaming of parameter a");
    }

    #[test]
    fn two_positions_cannot_share_a_name() {
        let err = resolve_err("f :: Nat -> Nat -> Nat\nf x 0 = x\nf 0 x = x");
        assert_eq!(err.message, "Parameter name x already in use");
    }

    #[test]
    fn repeated_variables_record_equality_constraints() {
        let program = resolved("same :: Nat -> Nat -> Bool\nsame x x = True\nsame x y = False");
        let repeated = &program.bodies[0].repeated;
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].name, "x");
        assert_eq!(repeated[0].positions, vec![0, 1]);
        // The second clause supplies the position names the constraint
        // resolves against.
        assert_eq!(program.defs[0].param_names, vec!["x", "y"]);
    }

    #[test]
    fn repeated_variable_must_be_named_somewhere() {
        let err = resolve_err("same :: Nat -> Nat -> Bool\nsame z z = True");
        assert_eq!(err.message, "Parameter z not declared");
    }

    #[test]
    fn repeated_variable_must_cover_its_declared_position() {
        let err = resolve_err("f :: Nat -> Nat -> Nat -> Nat\nf x 1 1 = x\nf 2 x x = 2");
        assert_eq!(
            err.message,
            "Name x doesn't match a parameter in positions 1, 2"
        );
    }

    #[test]
    fn all_variable_clause_becomes_the_catch_all() {
        let program = resolved("f :: Nat -> Nat\nf 0 = 0\nf n = n");
        assert_eq!(program.defs[0].clauses, vec![BodyId(0)]);
        assert_eq!(program.defs[0].default_clause, Some(BodyId(1)));
    }

    #[test]
    fn second_catch_all_is_rejected() {
        let err = resolve_err("f :: Nat -> Nat\nf a = a\nf a = 0");
        assert_eq!(err.message, "Function f already has a default clause");
    }

    #[test]
    fn calls_link_to_their_callees() {
        let program = resolved("f :: Nat -> Nat\nf n = n + 1\nmain :: Nat\nmain = f 3");
        let ExprKind::Call { def, .. } = &program.bodies[1].body.kind else {
            panic!("Expected Call");
        };
        assert_eq!(*def, Some(FuncId(0)));
    }

    #[test]
    fn undeclared_call_is_rejected_with_its_span() {
        let err = resolve_err("main :: Nat\nmain = missingFn 1");
        assert_eq!(err.message, "Function missingFn not declared");
        assert_eq!(err.span, Span::new(2, 8, 2, 19));
    }

    #[test]
    fn call_arity_is_checked() {
        let err = resolve_err("f :: Nat -> Nat\nf n = n\nmain :: Nat\nmain = f 1 2");
        assert_eq!(err.message, "Function f expects 1 arguments, got 2");
    }

    #[test]
    fn defaulted_parameters_widen_the_allowed_arity() {
        resolved("f :: Nat -> Nat = 5 -> Nat\nf a b = a + b\nmain :: Nat\nmain = f 1");
        let err =
            resolve_err("f :: Nat -> Nat = 5 -> Nat\nf a b = a + b\nmain :: Nat\nmain = f 1 2 3");
        assert_eq!(
            err.message,
            "Function f expects between 1 and 2 arguments, got 3"
        );
    }

    #[test]
    fn pattern_variables_are_marked_as_bindings() {
        let program = resolved("f :: [Nat] -> Nat\nf (x : xs) = x\nmain :: Nat\nmain = f [1]");
        let ClauseParam::Pattern(pattern) = &program.bodies[0].params[0] else {
            panic!("Expected Pattern");
        };
        let ExprKind::Binary { left, right, .. } = &pattern.expr.kind else {
            panic!("Expected Binary");
        };
        let ExprKind::Var {
            scope,
            inside_pattern,
            ..
        } = &left.kind
        else {
            panic!("Expected Var");
        };
        assert_eq!(*scope, Some(FuncId(0)));
        assert!(*inside_pattern);
        assert!(matches!(
            &right.kind,
            ExprKind::Var { inside_pattern: true, .. }
        ));

        // The body reads the binding; it is not itself a binding.
        let ExprKind::Var {
            scope,
            inside_pattern,
            ..
        } = &program.bodies[0].body.kind
        else {
            panic!("Expected Var");
        };
        assert_eq!(*scope, Some(FuncId(0)));
        assert!(!*inside_pattern);
    }

    #[test]
    fn parameterless_functions_resolve_as_top_level_constants() {
        let program = resolved("c :: Nat\nc = 4\nmain :: Nat\nmain = c");
        let ExprKind::Var { scope, .. } = &program.bodies[1].body.kind else {
            panic!("Expected Var");
        };
        assert_eq!(*scope, None);
        assert_eq!(program.defs[0].default_clause, Some(BodyId(0)));
    }

    #[test]
    fn parameter_reads_stay_function_scoped() {
        let program = resolved("f :: Nat -> Nat\nf n = n");
        let ExprKind::Var { scope, .. } = &program.bodies[0].body.kind else {
            panic!("Expected Var");
        };
        assert_eq!(*scope, Some(FuncId(0)));
    }
}
