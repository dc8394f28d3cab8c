use std::fmt;

use value::{Record, Value};

/// Static type carried by the builder.
///
/// Advisory while an expression is built, since nothing checks that a context path really holds
/// what it claims, and load-bearing at evaluation time where every path result is checked
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ValueType {
    Any,
    Bool,
    Int,
    Float,
    String,
    Record,
    Sequence(Box<ValueType>),
    Optional(Box<ValueType>),
}

impl ValueType {
    pub fn optional(self) -> Self {
        ValueType::Optional(Box::new(self))
    }

    pub fn sequence(self) -> Self {
        ValueType::Sequence(Box::new(self))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ValueType::Optional(_) | ValueType::Any)
    }

    /// Peels every `Optional` layer.
    pub fn strip_optional(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.strip_optional(),
            ty => ty,
        }
    }

    /// Whether `value` has this type. Sequences are checked element by element.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Optional(_), Value::Optional(None) | Value::Null) => true,
            (ValueType::Optional(inner), Value::Optional(Some(value))) => inner.admits(value),
            (ValueType::Optional(inner), value) => inner.admits(value),
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Int, Value::Int(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::String, Value::String(_))
            | (ValueType::Record, Value::Record(_)) => true,
            (ValueType::Sequence(inner), Value::Sequence(items)) => items.iter().all(|item| inner.admits(item)),
            // A present optional wrapping the right value is fine anywhere.
            (ty, Value::Optional(Some(value))) => ty.admits(value),
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("Any"),
            ValueType::Bool => f.write_str("Bool"),
            ValueType::Int => f.write_str("Int"),
            ValueType::Float => f.write_str("Float"),
            ValueType::String => f.write_str("String"),
            ValueType::Record => f.write_str("Record"),
            ValueType::Sequence(inner) => write!(f, "[{inner}]"),
            ValueType::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

/// Native types a [`crate::Remote`] can be typed over.
pub trait Typed {
    fn value_type() -> ValueType;
}

macro_rules! typed {
    ($($ty:ty => $value_type:ident),*) => {
        $(
            impl Typed for $ty {
                fn value_type() -> ValueType {
                    ValueType::$value_type
                }
            }
        )*
    };
}

typed!(bool => Bool, i32 => Int, i64 => Int, f64 => Float, String => String, Record => Record, Value => Any);

impl<A: Typed> Typed for Vec<A> {
    fn value_type() -> ValueType {
        A::value_type().sequence()
    }
}

impl<A: Typed> Typed for Option<A> {
    fn value_type() -> ValueType {
        A::value_type().optional()
    }
}
