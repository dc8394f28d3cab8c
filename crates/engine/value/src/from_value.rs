use crate::{Record, Value, ValueKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FromValueError {
    #[error("expected a {expected} value, found {found}")]
    UnexpectedKind { expected: ValueKind, found: ValueKind },
    #[error("expected a value, found nothing")]
    Absent,
}

/// Conversion out of the value model into a native type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, FromValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Null => Ok(None),
            value => value.into_present().map(T::from_value).transpose(),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match present(value)? {
            Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(unexpected(ValueKind::Sequence, &other)),
        }
    }
}

macro_rules! from_value {
    ($ty:ty, $kind:ident) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, FromValueError> {
                match present(value)? {
                    Value::$kind(inner) => Ok(inner),
                    other => Err(unexpected(ValueKind::$kind, &other)),
                }
            }
        }
    };
}

from_value!(bool, Bool);
from_value!(i64, Int);
from_value!(f64, Float);
from_value!(String, String);
from_value!(Record, Record);

fn present(value: Value) -> Result<Value, FromValueError> {
    match value.into_present() {
        None | Some(Value::Null) => Err(FromValueError::Absent),
        Some(value) => Ok(value),
    }
}

fn unexpected(expected: ValueKind, found: &Value) -> FromValueError {
    FromValueError::UnexpectedKind {
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_extraction() {
        assert_eq!(Value::present(3).into_typed::<i64>(), Ok(3));
        assert_eq!(Value::from(vec![1, 2]).into_typed::<Vec<i64>>(), Ok(vec![1, 2]));
        assert_eq!(Value::absent().into_typed::<Option<String>>(), Ok(None));
        assert_eq!(Value::Null.into_typed::<Option<bool>>(), Ok(None));
    }

    #[test]
    fn no_silent_coercion() {
        assert_eq!(
            Value::Int(1).into_typed::<f64>(),
            Err(FromValueError::UnexpectedKind {
                expected: ValueKind::Float,
                found: ValueKind::Int
            })
        );
        assert_eq!(Value::absent().into_typed::<i64>(), Err(FromValueError::Absent));
    }
}
