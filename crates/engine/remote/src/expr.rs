use std::sync::atomic::{AtomicU64, Ordering};

use value::Value;

use crate::{BinaryOp, PathSegment, UnaryOp, ValueType};

/// Identity of the element variable a `map` introduces.
///
/// Fresh per `map` call. Materialization rewrites every reference into a de Bruijn index, so
/// the number itself never reaches the lowered IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

impl BindingId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        BindingId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a builder path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// The first segments name the slot: any number of `parent`, then `value`, or a bare
    /// `args` / `env`.
    Context,
    Current,
    /// Number of hops up the context chain, `0` being the current context.
    Parent(u32),
    Args,
    Env,
    Binding(BindingId),
}

/// Untyped builder tree behind every [`crate::Remote`].
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(Value),
    Path {
        root: Root,
        segments: Vec<PathSegment>,
        expected: ValueType,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Map {
        source: Box<Expr>,
        binding: BindingId,
        transform: Box<Expr>,
    },
    FlattenOptional(Box<Expr>),
    Debug {
        label: String,
        source: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn path(root: Root, segments: Vec<PathSegment>, expected: ValueType) -> Self {
        Expr::Path {
            root,
            segments,
            expected,
        }
    }

    /// Extends a path in place, or reads the segment off each element of any other expression.
    pub(crate) fn descend(self, segment: PathSegment, expected: ValueType) -> Self {
        match self {
            Expr::Path { root, mut segments, .. } => {
                segments.push(segment);
                Expr::path(root, segments, expected)
            }
            source => {
                let binding = BindingId::fresh();
                Expr::Map {
                    source: Box::new(source),
                    binding,
                    transform: Box::new(Expr::path(Root::Binding(binding), vec![segment], expected)),
                }
            }
        }
    }

    /// Overrides the type a path claims to produce. No-op on anything else.
    pub(crate) fn retype(self, ty: ValueType) -> Self {
        match self {
            Expr::Path { root, segments, .. } => Expr::path(root, segments, ty),
            expr => expr,
        }
    }
}
