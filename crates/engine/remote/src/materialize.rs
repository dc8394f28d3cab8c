use crate::{
    expression::describe_segments, BindingId, ContextPath, Expr, Expression, PathRoot, PathSegment, Root, ValueType,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    #[error("a context path needs at least one segment naming the context slot")]
    EmptyPath,
    #[error("unknown context slot `{0}`, expected `value`, `parent`, `args` or `env`")]
    UnknownSlot(String),
    #[error("the path `{0}` ends on a context instead of a value")]
    IncompletePath(String),
    #[error("`{0}` can only be read from the current context")]
    AncestorSlot(String),
    #[error("a map element is referenced outside of its map")]
    UnboundElement,
}

impl Expr {
    /// Lowers a finished builder tree. Pure: the tree is left untouched and may be lowered again.
    pub fn materialize(&self) -> Result<Expression, MaterializeError> {
        Lowering::default().lower(self)
    }
}

#[derive(Default)]
struct Lowering {
    // Innermost binding last.
    scopes: Vec<BindingId>,
}

impl Lowering {
    fn lower(&mut self, expr: &Expr) -> Result<Expression, MaterializeError> {
        Ok(match expr {
            Expr::Constant(value) => Expression::Constant(value.clone()),
            Expr::Path {
                root,
                segments,
                expected,
            } => Expression::ContextPath(self.lower_path(*root, segments, expected)?),
            Expr::Binary { op, left, right } => Expression::Binary {
                op: *op,
                left: Box::new(self.lower(left)?),
                right: Box::new(self.lower(right)?),
            },
            Expr::Unary { op, operand } => Expression::Unary {
                op: *op,
                operand: Box::new(self.lower(operand)?),
            },
            Expr::Map {
                source,
                binding,
                transform,
            } => {
                let source = self.lower(source)?;
                self.scopes.push(*binding);
                let transform = self.lower(transform);
                self.scopes.pop();
                Expression::Map {
                    source: Box::new(source),
                    transform: Box::new(transform?),
                }
            }
            Expr::FlattenOptional(source) => Expression::FlattenOptional(Box::new(self.lower(source)?)),
            Expr::Debug { label, source } => Expression::Debug {
                label: label.clone(),
                source: Box::new(self.lower(source)?),
            },
        })
    }

    fn lower_path(
        &self,
        root: Root,
        segments: &[PathSegment],
        expected: &ValueType,
    ) -> Result<ContextPath, MaterializeError> {
        let (root, segments) = match root {
            Root::Context => normalize(segments)?,
            Root::Current | Root::Parent(0) => (PathRoot::Current, segments.to_vec()),
            Root::Parent(depth) => (PathRoot::Parent(depth), segments.to_vec()),
            Root::Args => (PathRoot::Args, segments.to_vec()),
            Root::Env => (PathRoot::Env, segments.to_vec()),
            Root::Binding(binding) => {
                let index = self
                    .scopes
                    .iter()
                    .rev()
                    .position(|scope| *scope == binding)
                    .ok_or(MaterializeError::UnboundElement)?;
                (PathRoot::Element(index as u32), segments.to_vec())
            }
        };

        Ok(ContextPath {
            root,
            segments,
            expected: expected.clone(),
        })
    }
}

/// Turns `["parent", "parent", "value", "a"]` into `(Parent(2), ["a"])`.
fn normalize(segments: &[PathSegment]) -> Result<(PathRoot, Vec<PathSegment>), MaterializeError> {
    let mut depth = 0u32;

    for (position, segment) in segments.iter().enumerate() {
        let rest = || segments[position + 1..].to_vec();

        let root = match segment.as_key() {
            Some("parent") => {
                depth += 1;
                continue;
            }
            Some("value") if depth == 0 => PathRoot::Current,
            Some("value") => PathRoot::Parent(depth),
            Some("args" | "env") if depth > 0 => {
                return Err(MaterializeError::AncestorSlot(describe_segments(
                    &segments[..=position],
                )));
            }
            Some("args") => PathRoot::Args,
            Some("env") => PathRoot::Env,
            _ => return Err(MaterializeError::UnknownSlot(segment.to_string())),
        };

        return Ok((root, rest()));
    }

    if segments.is_empty() {
        Err(MaterializeError::EmptyPath)
    } else {
        Err(MaterializeError::IncompletePath(describe_segments(segments)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw(segments: &[&str]) -> Result<(PathRoot, Vec<PathSegment>), MaterializeError> {
        normalize(&segments.iter().map(|s| PathSegment::from(*s)).collect::<Vec<_>>())
    }

    #[test]
    fn raw_paths_are_normalized() {
        assert_eq!(raw(&["value"]), Ok((PathRoot::Current, vec![])));
        assert_eq!(raw(&["value", "a"]), Ok((PathRoot::Current, vec!["a".into()])));
        assert_eq!(raw(&["parent", "value"]), Ok((PathRoot::Parent(1), vec![])));
        assert_eq!(raw(&["parent", "parent", "value", "x"]), Ok((PathRoot::Parent(2), vec!["x".into()])));
        assert_eq!(raw(&["args", "n"]), Ok((PathRoot::Args, vec!["n".into()])));
        assert_eq!(raw(&["env"]), Ok((PathRoot::Env, vec![])));
    }

    #[test]
    fn malformed_raw_paths() {
        assert_eq!(raw(&[]), Err(MaterializeError::EmptyPath));
        assert_eq!(raw(&["parent"]), Err(MaterializeError::IncompletePath("parent".into())));
        assert_eq!(raw(&["foo"]), Err(MaterializeError::UnknownSlot("foo".into())));
        assert_eq!(
            raw(&["parent", "args", "x"]),
            Err(MaterializeError::AncestorSlot("parent.args".into()))
        );
    }

    #[test]
    fn bindings_become_de_bruijn_indices() {
        let outer = BindingId::fresh();
        let inner = BindingId::fresh();
        let expr = Expr::Map {
            source: Box::new(Expr::path(Root::Current, vec![], ValueType::Any)),
            binding: outer,
            transform: Box::new(Expr::Map {
                source: Box::new(Expr::path(Root::Binding(outer), vec!["items".into()], ValueType::Any)),
                binding: inner,
                transform: Box::new(Expr::Binary {
                    op: crate::BinaryOp::Add,
                    left: Box::new(Expr::path(Root::Binding(inner), vec![], ValueType::Int)),
                    right: Box::new(Expr::path(Root::Binding(outer), vec!["offset".into()], ValueType::Int)),
                }),
            }),
        };

        let expression = expr.materialize().unwrap();
        assert_eq!(expression.to_string(), "map(value, map(it0.items, (it0 + it1.offset)))");
    }

    #[test]
    fn escaped_binding_is_rejected() {
        let expr = Expr::path(Root::Binding(BindingId::fresh()), vec![], ValueType::Any);
        assert_eq!(expr.materialize(), Err(MaterializeError::UnboundElement));
    }
}
