use std::sync::Arc;

use value::{Record, Value};

/// What an expression can read while it is evaluated.
///
/// A context is immutable. The executor derives a child for every resolved object or list
/// element, keeping the invoking context as its parent, so `Parent(n)` walks `n` levels up the
/// selection tree. Everything inside is reference counted: deriving a context never copies the
/// values it exposes.
#[derive(Debug, Clone)]
pub struct Context {
    current: Arc<Value>,
    parent: Option<Arc<Context>>,
    args: Arc<Record>,
    env: Arc<Record>,
    elements: Vec<Arc<Value>>,
}

impl Context {
    /// Root context of an execution, `current` being the request's root value.
    pub fn root(current: Value, env: Arc<Record>) -> Self {
        Context {
            current: Arc::new(current),
            parent: None,
            args: Arc::default(),
            env,
            elements: Vec::new(),
        }
    }

    /// A root context without any ambient values.
    pub fn new(current: impl Into<Value>) -> Self {
        Self::root(current.into(), Arc::default())
    }

    /// Context of a value produced while resolving a field of `parent`.
    pub fn child(parent: &Arc<Context>, current: Value) -> Self {
        Context {
            current: Arc::new(current),
            parent: Some(Arc::clone(parent)),
            args: Arc::default(),
            env: Arc::clone(&parent.env),
            elements: Vec::new(),
        }
    }

    /// Same context, with the arguments of the field about to be resolved.
    #[must_use]
    pub fn with_args(&self, args: impl Into<Arc<Record>>) -> Self {
        Context {
            args: args.into(),
            ..self.clone()
        }
    }

    /// Pushes a map element, which becomes `Element(0)`.
    #[must_use]
    pub fn bind_element(&self, element: Value) -> Self {
        let mut context = self.clone();
        context.elements.push(Arc::new(element));
        context
    }

    pub fn current(&self) -> &Value {
        &self.current
    }

    pub fn parent(&self) -> Option<&Context> {
        self.parent.as_deref()
    }

    /// `depth` levels up, `0` being this context.
    pub fn ancestor(&self, depth: u32) -> Option<&Context> {
        let mut context = self;
        for _ in 0..depth {
            context = context.parent()?;
        }
        Some(context)
    }

    pub fn args(&self) -> &Record {
        &self.args
    }

    pub fn env(&self) -> &Record {
        &self.env
    }

    /// Bound map elements, innermost last.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Value> + ExactSizeIterator + '_ {
        self.elements.iter().map(|element| element.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_follow_the_invoking_contexts() {
        let root = Arc::new(Context::new(Value::record([("value", 1)])));
        let child = Arc::new(Context::child(&root, Value::record([("value", 2)])));
        let grandchild = Context::child(&child, Value::Int(3));

        assert_eq!(grandchild.ancestor(0).map(Context::current), Some(&Value::Int(3)));
        assert_eq!(
            grandchild.ancestor(2).map(Context::current),
            Some(&Value::record([("value", 1)]))
        );
        assert!(grandchild.ancestor(3).is_none());
    }

    #[test]
    fn children_share_the_environment_but_not_the_arguments() {
        let env = Arc::new(Record::from_iter([("region", "eu")]));
        let root = Arc::new(Context::root(Value::Null, env).with_args(Record::from_iter([("n", 1)])));
        let child = Context::child(&root, Value::Null);

        assert_eq!(child.env().get("region"), Some(&Value::from("eu")));
        assert!(child.args().is_empty());
        assert_eq!(root.args().get("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn bound_elements_stack_up() {
        let context = Context::new(Value::Null)
            .bind_element(Value::Int(1))
            .bind_element(Value::Int(2));

        let innermost_first = context.elements().rev().cloned().collect::<Vec<_>>();
        assert_eq!(innermost_first, vec![Value::Int(2), Value::Int(1)]);
    }
}
