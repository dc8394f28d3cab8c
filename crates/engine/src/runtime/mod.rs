mod error;
mod ops;
mod path;

use config::LogLevel;
use remote::{ContextPath, Expression, PathRoot};
use schema::StepKind;
use tracing::Level;
use value::{AbsentPolicy, Value};

use crate::Context;

pub use error::EvalError;

/// Interpreter of compiled steps.
///
/// Holds no per-evaluation state, so one runtime is shared by every execution of an engine and
/// may evaluate from any number of threads at once. Evaluating the same expression against equal
/// contexts always yields equal results.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationRuntime {
    debug_level: LogLevel,
}

/// Why evaluation of a subtree stopped early.
enum Interrupt {
    /// A flattened optional was absent. Caught by the nearest enclosing map element or at the
    /// top of the expression, both of which become absent.
    Absent,
    Failed(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(err: EvalError) -> Self {
        Interrupt::Failed(err)
    }
}

impl EvaluationRuntime {
    /// `debug_level` is the level of the events emitted by `debug` nodes.
    pub fn new(debug_level: LogLevel) -> Self {
        EvaluationRuntime { debug_level }
    }

    pub fn evaluate(&self, expression: &Expression, context: &Context) -> Result<Value, EvalError> {
        let mut frame = Frame {
            runtime: self,
            context,
            elements: Vec::new(),
        };
        match frame.eval(expression) {
            Ok(value) => Ok(value),
            Err(Interrupt::Absent) => Ok(Value::absent()),
            Err(Interrupt::Failed(err)) => Err(err),
        }
    }

    pub fn evaluate_step(&self, step: &StepKind, context: &Context) -> Result<Value, EvalError> {
        match step {
            StepKind::Passthrough { key } => Ok(match context.current().as_present() {
                Some(Value::Record(record)) => record
                    .get(key)
                    .filter(|value| !value.is_nullish())
                    .map_or_else(Value::absent, |value| Value::present(value.clone())),
                _ => Value::absent(),
            }),
            StepKind::Constant(value) => Ok(value.clone()),
            StepKind::Computed(expression) => self.evaluate(expression, context),
        }
    }

    fn trace(&self, label: &str, value: &Value) {
        let Some(level) = self.debug_level.as_tracing_level() else {
            return;
        };
        let value = value.to_json_string(AbsentPolicy::Null);

        // `event!` needs a constant level.
        if level == Level::ERROR {
            tracing::event!(target: "remote::debug", Level::ERROR, label, value = value.as_str(), "debug");
        } else if level == Level::WARN {
            tracing::event!(target: "remote::debug", Level::WARN, label, value = value.as_str(), "debug");
        } else if level == Level::INFO {
            tracing::event!(target: "remote::debug", Level::INFO, label, value = value.as_str(), "debug");
        } else {
            tracing::event!(target: "remote::debug", Level::DEBUG, label, value = value.as_str(), "debug");
        }
    }
}

struct Frame<'a> {
    runtime: &'a EvaluationRuntime,
    context: &'a Context,
    /// Elements bound by the maps being evaluated, innermost last. They sit on top of the ones
    /// bound in the context.
    elements: Vec<Value>,
}

impl Frame<'_> {
    fn eval(&mut self, expression: &Expression) -> Result<Value, Interrupt> {
        match expression {
            Expression::Constant(value) => Ok(value.clone()),
            Expression::ContextPath(path) => Ok(self.resolve(path)?),
            Expression::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(ops::binary(*op, left, right)?)
            }
            Expression::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                Ok(ops::unary(*op, operand)?)
            }
            Expression::Map { source, transform } => match self.eval(source)? {
                Value::Sequence(items) => items
                    .into_iter()
                    .map(|item| self.apply(transform, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Sequence),
                Value::Optional(None) => Ok(Value::absent()),
                Value::Optional(Some(inner)) => self.apply(transform, *inner).map(Value::present),
                value => self.apply(transform, value),
            },
            Expression::FlattenOptional(source) => match self.eval(source)? {
                Value::Optional(None) => Err(Interrupt::Absent),
                Value::Optional(Some(inner)) => Ok(*inner),
                value => Ok(value),
            },
            Expression::Debug { label, source } => {
                let result = self.eval(source);
                match &result {
                    Ok(value) => self.runtime.trace(label, value),
                    Err(Interrupt::Absent) => self.runtime.trace(label, &Value::absent()),
                    Err(Interrupt::Failed(_)) => {}
                }
                result
            }
        }
    }

    /// Evaluates `transform` with `element` bound as `Element(0)`.
    fn apply(&mut self, transform: &Expression, element: Value) -> Result<Value, Interrupt> {
        self.elements.push(element);
        let result = self.eval(transform);
        self.elements.pop();
        match result {
            Err(Interrupt::Absent) => Ok(Value::absent()),
            result => result,
        }
    }

    fn resolve(&self, path: &ContextPath) -> Result<Value, EvalError> {
        let found = match path.root {
            PathRoot::Current => path::descend(self.context.current(), path)?,
            PathRoot::Parent(depth) => match self.context.ancestor(depth) {
                Some(ancestor) => path::descend(ancestor.current(), path)?,
                None => None,
            },
            PathRoot::Args => path::descend_record(self.context.args(), path)?,
            PathRoot::Env => path::descend_record(self.context.env(), path)?,
            PathRoot::Element(index) => {
                let element = self
                    .elements
                    .iter()
                    .rev()
                    .chain(self.context.elements().rev())
                    .nth(index as usize)
                    .ok_or(EvalError::UnboundElement(index))?;
                path::descend(element, path)?
            }
        };
        path::check(found, path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use remote::Remote;
    use value::Record;

    use super::*;

    fn evaluate<A>(remote: Remote<A>, context: &Context) -> Result<Value, EvalError> {
        let expression = remote.materialize().unwrap();
        EvaluationRuntime::default().evaluate(&expression, context)
    }

    #[test]
    fn reads_every_slot() {
        let env = Arc::new(Record::from_iter([("region", "eu")]));
        let root = Arc::new(Context::root(Value::Int(1), env));
        let context = Context::child(&root, Value::Int(2)).with_args(Record::from_iter([("n", 3)]));

        let sum =
            Remote::<i64>::path(["value"]) + Remote::<i64>::path(["parent", "value"]) + Remote::<i64>::args(["n"]);
        assert_eq!(evaluate(sum, &context), Ok(Value::Int(6)));

        let region = Remote::<String>::env(["region"]);
        assert_eq!(evaluate(region, &context), Ok(Value::from("eu")));
    }

    #[test]
    fn map_preserves_length_and_order() {
        let context = Context::new(Value::record([("xs", vec![3, 1, 2])]));
        let doubled = Remote::<Vec<i64>>::path(["value", "xs"]).map_each(|x| x * 2);

        assert_eq!(evaluate(doubled, &context), Ok(Value::from(vec![6, 2, 4])));
    }

    #[test]
    fn map_over_optionals() {
        let context = Context::new(Value::record([("a", 1)]));

        let present = Remote::<Option<i64>>::path(["value", "a"]).map_some(|a| a + 1);
        assert_eq!(evaluate(present, &context), Ok(Value::present(2)));

        let absent = Remote::<Option<i64>>::path(["value", "b"]).map_some(|b| b + 1);
        assert_eq!(evaluate(absent, &context), Ok(Value::absent()));
    }

    #[test]
    fn flattened_absence_stops_at_the_map_element() {
        let context = Context::new(Value::record([(
            "xs",
            Value::from(vec![Value::record([("a", 1)]), Value::Record(Record::new())]),
        )]));
        let values = Remote::<Vec<Record>>::path(["value", "xs"])
            .map_each(|x| x.get::<Option<i64>>("a").flatten() * 10);

        assert_eq!(evaluate(values, &context), Ok(Value::from(vec![Value::Int(10), Value::absent()])));
    }

    #[test]
    fn flattened_absence_at_the_top_is_not_an_error() {
        let absent = Remote::<Option<i64>>::constant(None).flatten();

        assert_eq!(evaluate(absent, &Context::new(Value::Null)), Ok(Value::absent()));
    }

    #[test]
    fn missing_required_path() {
        let missing = Remote::<i64>::path(["value", "missing"]);

        assert_eq!(
            evaluate(missing, &Context::new(Value::record([("a", 1)]))),
            Err(EvalError::MissingPath {
                path: "value.missing".into()
            })
        );
    }

    #[test]
    fn missing_ancestors_are_absent() {
        let grandparent = Remote::<Option<i64>>::path(["parent", "parent", "value"]);

        assert_eq!(evaluate(grandparent, &Context::new(Value::Null)), Ok(Value::absent()));
    }

    #[test]
    fn elements_bound_in_the_context() {
        let expression = Expression::ContextPath(ContextPath {
            root: PathRoot::Element(0),
            segments: Vec::new(),
            expected: remote::ValueType::Int,
        });
        let context = Context::new(Value::Null).bind_element(Value::Int(5));

        assert_eq!(
            EvaluationRuntime::default().evaluate(&expression, &context),
            Ok(Value::Int(5))
        );
        assert_eq!(
            EvaluationRuntime::default().evaluate(&expression, &Context::new(Value::Null)),
            Err(EvalError::UnboundElement(0))
        );
    }

    #[test]
    fn passthrough_never_fails() {
        let step = StepKind::Passthrough { key: "a".into() };
        let runtime = EvaluationRuntime::default();

        let found = runtime.evaluate_step(&step, &Context::new(Value::record([("a", 1)])));
        assert_eq!(found, Ok(Value::present(1)));

        for current in [
            Value::Int(100),
            Value::from("text"),
            Value::Null,
            Value::record([("a", Value::Null)]),
            Value::Record(Record::new()),
        ] {
            assert_eq!(runtime.evaluate_step(&step, &Context::new(current)), Ok(Value::absent()));
        }
    }

    #[test]
    fn untyped_map_elements() {
        let context = Context::new(Value::Null);

        let items = Remote::<Vec<i64>>::constant(vec![1, 2]).map(|x| x.debug("x"));
        assert_eq!(evaluate(items, &context), Ok(Value::from(vec![1, 2])));

        let single = Remote::<i64>::constant(3).map(|x| x.equal(Remote::constant(3)));
        assert_eq!(evaluate(single, &context), Ok(Value::Bool(true)));
    }

    #[test]
    fn debug_passes_values_through() {
        let traced = (Remote::<i64>::path(["value", "a"]) + 1).debug("a + 1");

        assert_eq!(
            evaluate(traced, &Context::new(Value::record([("a", 1)]))),
            Ok(Value::Int(2))
        );
    }
}
