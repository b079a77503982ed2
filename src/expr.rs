use std::sync::atomic::{AtomicU64, Ordering};

use crate::token::Token;

/// Stable identity for a named-reference expression.
///
/// The resolver records binding distances in a side table keyed by this id,
/// so ids must stay unique for the lifetime of an interpreter — a REPL parses
/// many programs into the same interpreter, hence the process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u64);

static NEXT_EXPR_ID: AtomicU64 = AtomicU64::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),

    /// The literal's value lives on the token (`NUMBER`, `STRING`, `TRUE`,
    /// `FALSE`, `NIL`).
    Literal(Token),

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

// Structural equality, ignoring `ExprId`s: two separately parsed programs get
// different ids but the same shape, and tests compare shapes.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Expr::Binary {
                    left: l1,
                    operator: o1,
                    right: r1,
                },
                Expr::Binary {
                    left: l2,
                    operator: o2,
                    right: r2,
                },
            )
            | (
                Expr::Logical {
                    left: l1,
                    operator: o1,
                    right: r1,
                },
                Expr::Logical {
                    left: l2,
                    operator: o2,
                    right: r2,
                },
            ) => l1 == l2 && o1 == o2 && r1 == r2,

            (
                Expr::Unary {
                    operator: o1,
                    right: r1,
                },
                Expr::Unary {
                    operator: o2,
                    right: r2,
                },
            ) => o1 == o2 && r1 == r2,

            (Expr::Grouping(a), Expr::Grouping(b)) => a == b,

            (Expr::Literal(a), Expr::Literal(b)) => a == b,

            (Expr::Variable { name: a, .. }, Expr::Variable { name: b, .. }) => a == b,

            (
                Expr::Assign {
                    name: n1,
                    value: v1,
                    ..
                },
                Expr::Assign {
                    name: n2,
                    value: v2,
                    ..
                },
            ) => n1 == n2 && v1 == v2,

            (
                Expr::Call {
                    callee: c1,
                    arguments: a1,
                    ..
                },
                Expr::Call {
                    callee: c2,
                    arguments: a2,
                    ..
                },
            ) => c1 == c2 && a1 == a2,

            (
                Expr::Get {
                    object: o1,
                    name: n1,
                },
                Expr::Get {
                    object: o2,
                    name: n2,
                },
            ) => o1 == o2 && n1 == n2,

            (
                Expr::Set {
                    object: o1,
                    name: n1,
                    value: v1,
                },
                Expr::Set {
                    object: o2,
                    name: n2,
                    value: v2,
                },
            ) => o1 == o2 && n1 == n2 && v1 == v2,

            (Expr::This { .. }, Expr::This { .. }) => true,

            (Expr::Super { method: m1, .. }, Expr::Super { method: m2, .. }) => m1 == m2,

            _ => false,
        }
    }
}
