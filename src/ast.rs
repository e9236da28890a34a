//! Abstract Syntax Tree — typed nodes for the Husk language.
//!
//! Every AST node carries a [`Span`] for error reporting. The tree is
//! arena-flavored: [`Program`] owns all signatures and clauses in two flat
//! vectors, and every cross-reference between them is an integer index
//! ([`FuncId`], [`BodyId`]) rather than a pointer, so the clause→signature
//! and call→callee back-edges never form ownership cycles.
//!
//! This module defines the grammar of Husk as Rust types. The parser
//! constructs this tree; name resolution fills in the index links and
//! variable scopes; the type checker stores one resolved [`Ty`] on every
//! expression it accepts; code generation walks the finished tree.

use crate::token::Span;
use std::fmt;

/// Index of a signature in [`Program::defs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub usize);

/// Index of a clause in [`Program::bodies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(pub usize);

/// A complete source file: signatures and clauses in declaration order.
#[derive(Debug, Default)]
pub struct Program {
    pub defs: Vec<FuncDef>,
    pub bodies: Vec<FuncBody>,
}

impl Program {
    pub fn def(&self, id: FuncId) -> &FuncDef {
        &self.defs[id.0]
    }

    pub fn body(&self, id: BodyId) -> &FuncBody {
        &self.bodies[id.0]
    }
}

// ── Types ────────────────────────────────────────────────────────────

/// A structural type: a name applied to zero or more type parameters.
///
/// Built-ins are `Nat`, `Bool`, `List` (one parameter), and `Tuple` (any
/// arity); anything else is an opaque user name. Equality is derived and
/// purely structural — same name, same arity, pairwise-equal parameters —
/// and there is no subtyping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ty {
    pub name: String,
    pub params: Vec<Ty>,
}

impl Ty {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn nat() -> Self {
        Self::named("Nat")
    }

    pub fn bool() -> Self {
        Self::named("Bool")
    }

    pub fn list(element: Ty) -> Self {
        Self {
            name: "List".into(),
            params: vec![element],
        }
    }

    pub fn tuple(elements: Vec<Ty>) -> Self {
        Self {
            name: "Tuple".into(),
            params: elements,
        }
    }

    pub fn is_list(&self) -> bool {
        self.name == "List" && self.params.len() == 1
    }

    pub fn is_tuple(&self) -> bool {
        self.name == "Tuple"
    }
}

impl fmt::Display for Ty {
    /// Source-level spelling: `[T]` for lists, `(A, B)` for tuples (with the
    /// trailing comma for 1-tuples), juxtaposition for named applications.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list() {
            return write!(f, "[{}]", self.params[0]);
        }
        if self.is_tuple() {
            write!(f, "(")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            if self.params.len() == 1 {
                write!(f, ",")?;
            }
            return write!(f, ")");
        }
        write!(f, "{}", self.name)?;
        for param in &self.params {
            if param.params.is_empty() {
                write!(f, " {}", param)?;
            } else {
                write!(f, " ({})", param)?;
            }
        }
        Ok(())
    }
}

// ── Signatures ───────────────────────────────────────────────────────

/// One parameter slot of a signature: the declared type plus an optional
/// constant default expression (`name :: Nat = 3 -> Nat`). A defaulted
/// parameter makes the corresponding trailing call argument optional.
#[derive(Debug)]
pub struct Param {
    pub ty: Ty,
    pub default: Option<Expr>,
    pub span: Span,
}

/// A declared function signature: `name :: T1 -> T2 -> R`.
#[derive(Debug)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Ty,
    /// Catch-all body supplied as a default on the return type
    /// (`name :: Nat -> Nat = 0`). Used when no clause matches and no
    /// all-variables clause exists.
    pub default_value: Option<Expr>,
    /// Display name per parameter position. Synthesized by the parser as
    /// `<lowercase type name><index>` and overwritten when a clause names
    /// the position.
    pub param_names: Vec<String>,
    /// Names explicitly claimed by clauses, one slot per position. A
    /// position may be claimed once, and no two positions may claim the
    /// same name.
    pub user_named: Vec<Option<String>>,
    /// Pattern clauses, in declaration order.
    pub clauses: Vec<BodyId>,
    /// The all-distinct-variables clause, if one was declared.
    pub default_clause: Option<BodyId>,
    pub span: Span,
}

impl FuncDef {
    /// Number of arguments a call must supply at minimum: every parameter
    /// without a default.
    pub fn mandatory_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

// ── Clauses ──────────────────────────────────────────────────────────

/// One pattern-matching clause of a function: `name p1 p2 = body`.
#[derive(Debug)]
pub struct FuncBody {
    pub name: String,
    pub params: Vec<ClauseParam>,
    pub body: Expr,
    /// Signature this clause belongs to; set during name resolution.
    pub def: Option<FuncId>,
    /// Variables occurring at more than one parameter slot, with the slots
    /// they occupy, in first-occurrence order. Each entry is an equality
    /// constraint between those positions; the order fixes the order of the
    /// generated equality checks.
    pub repeated: Vec<RepeatedVar>,
    pub span: Span,
}

/// A repeated-variable constraint: `name` occurs at every slot in
/// `positions` (at least two), so the arguments there must be equal.
#[derive(Debug)]
pub struct RepeatedVar {
    pub name: String,
    pub positions: Vec<usize>,
}

/// A clause parameter slot: either a bare variable binding the argument (and
/// naming the position) or a pattern the argument must match.
#[derive(Debug)]
pub enum ClauseParam {
    Var(VarSlot),
    Pattern(Pattern),
}

impl ClauseParam {
    pub fn span(&self) -> Span {
        match self {
            ClauseParam::Var(slot) => slot.span,
            ClauseParam::Pattern(pattern) => pattern.span,
        }
    }
}

/// A bare variable in parameter position: `n` in `sum n = ...`.
#[derive(Debug)]
pub struct VarSlot {
    pub name: String,
    pub span: Span,
}

/// A literal or structural pattern in parameter position: `0`, `[]`,
/// `(x : xs)`, `(a, b)`.
#[derive(Debug)]
pub struct Pattern {
    pub expr: Expr,
    pub span: Span,
}

// ── Expressions ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Resolved type; filled in by the type checker, `None` before it runs.
    pub ty: Option<Ty>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// Whether this expression is a constant: literals and
    /// list/tuple/operator combinations of constants. Variables and calls
    /// are not constant. Signature defaults must satisfy this.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Nat(_) | ExprKind::Bool(_) => true,
            ExprKind::List(values) | ExprKind::Tuple(values) => {
                values.iter().all(Expr::is_constant)
            }
            ExprKind::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            ExprKind::Var { .. } | ExprKind::Call { .. } => false,
        }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    /// Natural literal: `42`
    Nat(u64),

    /// Boolean literal: `True` / `False`
    Bool(bool),

    /// List literal: `[1, 2, 3]`
    List(Vec<Expr>),

    /// Tuple literal: `(a, b)`; 1-tuples are written `(a,)`
    Tuple(Vec<Expr>),

    /// Variable reference: `x`. `scope` is the enclosing function (or
    /// `None` for a top-level constant), set during name resolution.
    /// `inside_pattern` marks a fresh binding introduced by a pattern
    /// rather than a read.
    Var {
        name: String,
        scope: Option<FuncId>,
        inside_pattern: bool,
    },

    /// Binary operation: `a + b`. All operators associate to the right and
    /// have no precedence among themselves.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Call by juxtaposition: `f a b`. `def` is the resolved callee, set
    /// during name resolution.
    Call {
        name: String,
        args: Vec<Expr>,
        def: Option<FuncId>,
    },
}

// ── Operators ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `:` — list construction
    Cons,
    /// `!!` — list indexing
    Index,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `==`
    Eq,
}

impl BinOp {
    /// Map an operator lexeme to its kind. The lexer emits exactly these
    /// eight spellings under [`crate::token::TokenKind::BinOp`].
    pub fn from_text(text: &str) -> BinOp {
        match text {
            ":" => BinOp::Cons,
            "!!" => BinOp::Index,
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "<" => BinOp::Lt,
            "<=" => BinOp::Lte,
            "==" => BinOp::Eq,
            _ => unreachable!("lexer emits only known operators"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinOp::Cons => ":",
            BinOp::Index => "!!",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::Eq => "==",
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_display_matches_source_spelling() {
        assert_eq!(Ty::nat().to_string(), "Nat");
        assert_eq!(Ty::list(Ty::nat()).to_string(), "[Nat]");
        assert_eq!(Ty::list(Ty::list(Ty::bool())).to_string(), "[[Bool]]");
        assert_eq!(Ty::tuple(vec![Ty::nat(), Ty::bool()]).to_string(), "(Nat, Bool)");
        assert_eq!(Ty::tuple(vec![Ty::nat()]).to_string(), "(Nat,)");
    }

    #[test]
    fn parameterized_type_arguments_get_parentheses() {
        let pair = Ty {
            name: "Pair".into(),
            params: vec![Ty::nat(), Ty::bool()],
        };
        assert_eq!(pair.to_string(), "Pair Nat Bool");
        let nested = Ty {
            name: "Triple".into(),
            params: vec![pair, Ty::nat()],
        };
        assert_eq!(nested.to_string(), "Triple (Pair Nat Bool) Nat");
    }

    #[test]
    fn structural_equality_is_pairwise() {
        assert_eq!(Ty::list(Ty::nat()), Ty::list(Ty::nat()));
        assert_ne!(Ty::list(Ty::nat()), Ty::list(Ty::bool()));
        assert_ne!(Ty::tuple(vec![Ty::nat()]), Ty::tuple(vec![Ty::nat(), Ty::nat()]));
        assert_ne!(Ty::named("Nat"), Ty::named("nat"));
    }

    #[test]
    fn constants_are_literal_combinations() {
        let span = Span::point(1, 1);
        let nat = |n| Expr::new(ExprKind::Nat(n), span);
        assert!(nat(3).is_constant());
        assert!(Expr::new(ExprKind::List(vec![nat(1), nat(2)]), span).is_constant());
        assert!(Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                left: Box::new(nat(1)),
                right: Box::new(nat(2)),
            },
            span
        )
        .is_constant());
        let var = Expr::new(
            ExprKind::Var {
                name: "x".into(),
                scope: None,
                inside_pattern: false,
            },
            span,
        );
        assert!(!var.is_constant());
        assert!(!Expr::new(ExprKind::List(vec![var]), span).is_constant());
    }
}
