use std::{
    fmt,
    marker::PhantomData,
    ops::{Add, Div, Mul, Neg, Not, Rem, Sub},
};

use value::Value;

use crate::{BinaryOp, BindingId, Expr, Expression, MaterializeError, PathSegment, Root, Typed, UnaryOp, ValueType};

/// A value of type `A` that will only exist once a field is resolved.
///
/// Every method returns a new description; nothing is evaluated. The type parameter lets the
/// builder reject `Remote<String> + Remote<i64>` and similar mistakes before a schema is ever
/// compiled, while the underlying [`Expr`] stays untyped.
pub struct Remote<A> {
    expr: Expr,
    _output: PhantomData<fn() -> A>,
}

impl<A> Clone for Remote<A> {
    fn clone(&self) -> Self {
        Remote::from_expr(self.expr.clone())
    }
}

impl<A> fmt::Debug for Remote<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Remote").field(&self.expr).finish()
    }
}

fn segments<S: Into<PathSegment>>(segments: impl IntoIterator<Item = S>) -> Vec<PathSegment> {
    segments.into_iter().map(Into::into).collect()
}

impl<A> Remote<A> {
    fn from_expr(expr: Expr) -> Self {
        Remote {
            expr,
            _output: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Lowers the finished tree into the portable IR.
    pub fn materialize(&self) -> Result<Expression, MaterializeError> {
        self.expr.materialize()
    }

    /// Drops the static type. The result is checked at evaluation time only.
    pub fn erase(self) -> Remote<Value> {
        Remote::from_expr(self.expr.retype(ValueType::Any))
    }

    /// Logs the value this produces, labelled, every time it is evaluated. The result is the
    /// value itself.
    pub fn debug(self, label: impl Into<String>) -> Self {
        Remote::from_expr(Expr::Debug {
            label: label.into(),
            source: Box::new(self.expr),
        })
    }

    fn binary<B, C>(self, op: BinaryOp, rhs: Remote<B>) -> Remote<C> {
        Remote::from_expr(Expr::Binary {
            op,
            left: Box::new(self.expr),
            right: Box::new(rhs.expr),
        })
    }

    fn unary(self, op: UnaryOp) -> Self {
        Remote::from_expr(Expr::Unary {
            op,
            operand: Box::new(self.expr),
        })
    }
}

impl<A: Typed> Remote<A> {
    pub fn constant(value: A) -> Self
    where
        A: Into<Value>,
    {
        Remote::from_expr(Expr::Constant(value.into()))
    }

    /// A raw context path. The leading segments pick the slot: `["value", ..]` is the current
    /// value, `["parent", "value", ..]` the parent's (repeat `parent` to go further up),
    /// `["args", ..]` the field arguments and `["env", ..]` the execution environment.
    ///
    /// The slot is validated by [`Remote::materialize`].
    pub fn path<S: Into<PathSegment>>(path: impl IntoIterator<Item = S>) -> Self {
        Remote::from_expr(Expr::path(Root::Context, segments(path), A::value_type()))
    }

    pub fn current<S: Into<PathSegment>>(path: impl IntoIterator<Item = S>) -> Self {
        Remote::from_expr(Expr::path(Root::Current, segments(path), A::value_type()))
    }

    pub fn parent<S: Into<PathSegment>>(path: impl IntoIterator<Item = S>) -> Self {
        Self::ancestor(1, path)
    }

    /// `depth` hops up the context chain; `0` is the current context.
    pub fn ancestor<S: Into<PathSegment>>(depth: u32, path: impl IntoIterator<Item = S>) -> Self {
        Remote::from_expr(Expr::path(Root::Parent(depth), segments(path), A::value_type()))
    }

    pub fn args<S: Into<PathSegment>>(path: impl IntoIterator<Item = S>) -> Self {
        Remote::from_expr(Expr::path(Root::Args, segments(path), A::value_type()))
    }

    pub fn env<S: Into<PathSegment>>(path: impl IntoIterator<Item = S>) -> Self {
        Remote::from_expr(Expr::path(Root::Env, segments(path), A::value_type()))
    }

    /// Reads `key` off the produced record.
    pub fn get<B: Typed>(self, key: impl Into<String>) -> Remote<B> {
        Remote::from_expr(self.expr.descend(PathSegment::Key(key.into()), B::value_type()))
    }

    /// Reads the `index`-th item off the produced sequence.
    pub fn at<B: Typed>(self, index: usize) -> Remote<B> {
        Remote::from_expr(self.expr.descend(PathSegment::Index(index), B::value_type()))
    }

    /// Applies `f` to the produced value.
    ///
    /// When the value turns out to be a sequence or an optional at evaluation time, `f` applies
    /// to each item or to the present value instead, so the element `f` receives is left
    /// untyped.
    pub fn map<B: Typed>(self, f: impl FnOnce(Remote<A>) -> Remote<B>) -> Remote<B> {
        self.map_with(ValueType::Any, f)
    }

    pub fn equal(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::Equal, other)
    }

    pub fn not_equal(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::NotEqual, other)
    }

    pub fn less_than(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::LessThan, other)
    }

    pub fn less_or_equal(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::LessOrEqual, other)
    }

    pub fn greater_than(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::GreaterThan, other)
    }

    pub fn greater_or_equal(self, other: Remote<A>) -> Remote<bool> {
        self.binary(BinaryOp::GreaterOrEqual, other)
    }

    /// `element` is the type the bound element is checked against.
    fn map_with<E, B, C>(self, element: ValueType, f: impl FnOnce(Remote<E>) -> Remote<B>) -> Remote<C> {
        let binding = BindingId::fresh();
        let element = Remote::from_expr(Expr::path(Root::Binding(binding), Vec::new(), element));
        Remote::from_expr(Expr::Map {
            source: Box::new(self.expr),
            binding,
            transform: Box::new(f(element).expr),
        })
    }
}

impl<A: Typed> Remote<Vec<A>> {
    /// Applies `f` to every item.
    pub fn map_each<B: Typed>(self, f: impl FnOnce(Remote<A>) -> Remote<B>) -> Remote<Vec<B>> {
        self.map_with(A::value_type(), f)
    }
}

impl<A: Typed> Remote<Option<A>> {
    /// Applies `f` to the present value; absent stays absent.
    pub fn map_some<B: Typed>(self, f: impl FnOnce(Remote<A>) -> Remote<B>) -> Remote<Option<B>> {
        self.map_with(A::value_type(), f)
    }

    /// Like [`Remote::map_some`] for an `f` that may itself produce absent.
    pub fn flat_map<B: Typed>(self, f: impl FnOnce(Remote<A>) -> Remote<Option<B>>) -> Remote<Option<B>> {
        Remote::from_expr(Expr::FlattenOptional(Box::new(self.map_some(f).expr)))
    }

    /// Unwraps the present value. Evaluating this on absent abandons the innermost enclosing map
    /// element, or the whole expression, with an absent result.
    pub fn flatten(self) -> Remote<A> {
        Remote::from_expr(Expr::FlattenOptional(Box::new(self.expr)))
    }
}

impl Remote<bool> {
    pub fn and(self, other: Remote<bool>) -> Remote<bool> {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: Remote<bool>) -> Remote<bool> {
        self.binary(BinaryOp::Or, other)
    }
}

impl Remote<String> {
    pub fn concat(self, other: Remote<String>) -> Remote<String> {
        self.binary(BinaryOp::Concat, other)
    }
}

macro_rules! arithmetic {
    ($ty:ty: $($trait:ident::$method:ident => $op:ident),*) => {
        $(
            impl $trait for Remote<$ty> {
                type Output = Remote<$ty>;

                fn $method(self, rhs: Remote<$ty>) -> Self::Output {
                    self.binary(BinaryOp::$op, rhs)
                }
            }

            impl $trait<$ty> for Remote<$ty> {
                type Output = Remote<$ty>;

                fn $method(self, rhs: $ty) -> Self::Output {
                    self.binary(BinaryOp::$op, Remote::<$ty>::constant(rhs))
                }
            }
        )*
    };
}

arithmetic!(i64: Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div, Rem::rem => Rem);
arithmetic!(f64: Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div);

impl Neg for Remote<i64> {
    type Output = Remote<i64>;

    fn neg(self) -> Self::Output {
        self.unary(UnaryOp::Neg)
    }
}

impl Neg for Remote<f64> {
    type Output = Remote<f64>;

    fn neg(self) -> Self::Output {
        self.unary(UnaryOp::Neg)
    }
}

impl Not for Remote<bool> {
    type Output = Remote<bool>;

    fn not(self) -> Self::Output {
        self.unary(UnaryOp::Not)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use value::Record;

    use super::*;

    fn lowered<A>(remote: Remote<A>) -> String {
        remote.materialize().unwrap().to_string()
    }

    #[test]
    fn path_plus_constant() {
        let remote = Remote::<i64>::current(["a"]) + 1;
        assert_eq!(lowered(remote), "(value.a + 1)");
    }

    #[test]
    fn raw_and_explicit_paths_lower_alike() {
        assert_eq!(
            Remote::<i64>::path(["value", "a"]).materialize(),
            Remote::<i64>::current(["a"]).materialize()
        );
        assert_eq!(
            Remote::<i64>::path(["parent", "parent", "value"]).materialize(),
            Remote::<i64>::ancestor(2, Vec::<&str>::new()).materialize()
        );
    }

    #[test]
    fn descending_keeps_a_single_path() {
        let remote = Remote::<Record>::current(["a"]).get::<Vec<i64>>("b").at::<i64>(1);
        let Expression::ContextPath(path) = remote.materialize().unwrap() else {
            unreachable!()
        };
        assert_eq!(path.to_string(), "value.a.b.1");
        assert_eq!(path.expected, ValueType::Int);
    }

    #[test]
    fn descending_a_computed_value_maps() {
        let remote = Remote::<Vec<Value>>::constant(vec![Value::record([("x", 1)])]).get::<i64>("x");
        assert_eq!(lowered(remote), r#"map([{"x":1}], it0.x)"#);
    }

    #[test]
    fn nested_maps() {
        let remote = Remote::<Vec<Vec<i64>>>::current(["matrix"])
            .map_each(|row| row.map_each(|cell| cell * 2))
            .debug("doubled");
        assert_eq!(lowered(remote), r#"debug("doubled", map(value.matrix, map(it0, (it0 * 2))))"#);
    }

    #[test]
    fn flat_map_flattens_once() {
        let remote = Remote::<Option<Record>>::current(["maybe"]).flat_map(|record| record.get::<Option<i64>>("n"));
        assert_eq!(lowered(remote), "flatten(map(value.maybe, it0.n))");
    }

    #[test]
    fn operators() {
        let flag = (!Remote::<i64>::args(["n"]).greater_than(Remote::constant(3)))
            .and(Remote::<String>::env(["mode"]).equal(Remote::constant(String::from("strict"))));
        assert_eq!(lowered(flag), r#"(!(args.n > 3) && (env.mode == "strict"))"#);
        assert_eq!(lowered(-Remote::<f64>::current(["x"]) / 2.0), "(-value.x / 2.0)");
    }

    #[test]
    fn erasing_relaxes_the_checked_type() {
        let Expression::ContextPath(path) = Remote::<i64>::current(["a"]).erase().materialize().unwrap() else {
            unreachable!()
        };
        assert_eq!(path.expected, ValueType::Any);
    }

    #[test]
    fn building_is_pure() {
        let base = Remote::<i64>::current(["a"]);
        let left = base.clone() + 1;
        let right = base.clone() * 2;
        assert_eq!(lowered(base), "value.a");
        assert_eq!(lowered(left), "(value.a + 1)");
        assert_eq!(lowered(right), "(value.a * 2)");
    }

    #[test]
    fn lowered_form_is_portable() {
        let expression = (Remote::<i64>::path(["parent", "value", "n"]) + 1).materialize().unwrap();
        let json = serde_json::to_string(&expression).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expression);
        insta::assert_json_snapshot!(expression, @r###"
        {
          "Binary": {
            "op": "Add",
            "left": {
              "ContextPath": {
                "root": {
                  "Parent": 1
                },
                "segments": [
                  {
                    "Key": "n"
                  }
                ],
                "expected": "Int"
              }
            },
            "right": {
              "Constant": {
                "Int": 1
              }
            }
          }
        }
        "###);
    }
}
