use std::fmt;

use itertools::Itertools;
use value::{AbsentPolicy, Value};

use crate::{BinaryOp, PathSegment, UnaryOp, ValueType};

/// The materialized, portable form of a resolver expression.
///
/// Closed over nothing but constants and context paths. It can be serialized, stored next to a
/// compiled schema and evaluated by any number of concurrent interpreters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expression {
    Constant(Value),
    ContextPath(ContextPath),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// Applies `transform` to the source. Inside `transform`, `PathRoot::Element(0)` is the
    /// element being transformed.
    Map {
        source: Box<Expression>,
        transform: Box<Expression>,
    },
    FlattenOptional(Box<Expression>),
    Debug {
        label: String,
        source: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContextPath {
    pub root: PathRoot,
    pub segments: Vec<PathSegment>,
    /// Type the resolved value is checked against.
    pub expected: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PathRoot {
    Current,
    /// Always at least `1`.
    Parent(u32),
    Args,
    Env,
    /// De Bruijn index of an enclosing `Map` element, `0` being the innermost.
    Element(u32),
}

impl Expression {
    /// Context paths reachable from this expression, in evaluation order.
    pub fn context_paths(&self) -> Vec<&ContextPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a ContextPath>) {
        match self {
            Expression::Constant(_) => {}
            Expression::ContextPath(path) => paths.push(path),
            Expression::Binary { left, right, .. } => {
                left.collect_paths(paths);
                right.collect_paths(paths);
            }
            Expression::Unary { operand, .. } => operand.collect_paths(paths),
            Expression::Map { source, transform } => {
                source.collect_paths(paths);
                transform.collect_paths(paths);
            }
            Expression::FlattenOptional(source) | Expression::Debug { source, .. } => source.collect_paths(paths),
        }
    }
}

impl fmt::Display for PathRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRoot::Current => f.write_str("value"),
            PathRoot::Parent(1) => f.write_str("parent.value"),
            PathRoot::Parent(depth) => write!(f, "parent^{depth}.value"),
            PathRoot::Args => f.write_str("args"),
            PathRoot::Env => f.write_str("env"),
            PathRoot::Element(index) => write!(f, "it{index}"),
        }
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{}", value.to_json(AbsentPolicy::Null)),
            Expression::ContextPath(path) => write!(f, "{path}"),
            Expression::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expression::Unary { op, operand } => write!(f, "{op}{operand}"),
            Expression::Map { source, transform } => write!(f, "map({source}, {transform})"),
            Expression::FlattenOptional(source) => write!(f, "flatten({source})"),
            Expression::Debug { label, source } => write!(f, "debug({label:?}, {source})"),
        }
    }
}

/// Short human summary of a list of paths, for diagnostics.
pub(crate) fn describe_segments(segments: &[PathSegment]) -> String {
    segments.iter().join(".")
}
