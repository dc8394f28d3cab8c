use std::fmt;

use async_graphql_value::ConstValue;
use schema::{BaseType, ScalarType, TypeRef};
use value::{Record, Value};

use crate::Location;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum InputValueError {
    #[error("Found a null where we expected a {expected}{path}")]
    UnexpectedNull {
        expected: String,
        path: ValuePath,
        location: Location,
    },
    #[error("Found a {actual} value where we expected a {expected}{path}")]
    MissingList {
        actual: InputValueKind,
        expected: String,
        path: ValuePath,
        location: Location,
    },
    #[error("Found a {actual} value where we expected a {expected} scalar{path}")]
    IncorrectScalarType {
        actual: InputValueKind,
        expected: String,
        path: ValuePath,
        location: Location,
    },
    #[error("Found value {actual} which cannot be coerced into a {expected} scalar{path}")]
    IncorrectScalarValue {
        actual: String,
        expected: String,
        path: ValuePath,
        location: Location,
    },
    #[error("Unknown type '{name}'{path}")]
    UnknownType {
        name: String,
        path: ValuePath,
        location: Location,
    },
}

impl InputValueError {
    pub fn location(&self) -> Location {
        match self {
            InputValueError::UnexpectedNull { location, .. }
            | InputValueError::MissingList { location, .. }
            | InputValueError::IncorrectScalarType { location, .. }
            | InputValueError::IncorrectScalarValue { location, .. }
            | InputValueError::UnknownType { location, .. } => *location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum InputValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
    Binary,
    List,
    Object,
    Null,
}

impl From<&ConstValue> for InputValueKind {
    fn from(value: &ConstValue) -> Self {
        match value {
            ConstValue::Null => InputValueKind::Null,
            ConstValue::Number(number) if number.is_f64() => InputValueKind::Float,
            ConstValue::Number(_) => InputValueKind::Integer,
            ConstValue::String(_) => InputValueKind::String,
            ConstValue::Boolean(_) => InputValueKind::Boolean,
            ConstValue::Binary(_) => InputValueKind::Binary,
            ConstValue::Enum(_) => InputValueKind::Enum,
            ConstValue::List(_) => InputValueKind::List,
            ConstValue::Object(_) => InputValueKind::Object,
        }
    }
}

/// Indices into the list being coerced, rendered as ` at path '.0.1'` in messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ValuePath(Vec<usize>);

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" at path '")?;
        for index in &self.0 {
            write!(f, ".{index}")?;
        }
        f.write_str("'")
    }
}

/// GraphQL input coercion of a literal or variable value against an argument or variable type.
/// Arguments are built of scalars only.
pub(crate) fn coerce_input_value(
    ty: &TypeRef,
    value: ConstValue,
    location: Location,
) -> Result<Value, InputValueError> {
    let mut ctx = InputCoercionContext {
        location,
        value_path: Vec::new(),
    };
    ctx.coerce_input_value(ty, value)
}

struct InputCoercionContext {
    location: Location,
    value_path: Vec<usize>,
}

impl InputCoercionContext {
    fn coerce_input_value(&mut self, ty: &TypeRef, value: ConstValue) -> Result<Value, InputValueError> {
        // A single item is accepted where a list is expected.
        if let BaseType::List(item) = &ty.base {
            if !matches!(value, ConstValue::List(_) | ConstValue::Null) {
                return Ok(Value::Sequence(vec![self.coerce_input_value(item, value)?]));
            }
        }

        match (&ty.base, value) {
            (_, ConstValue::Null) if ty.required => Err(InputValueError::UnexpectedNull {
                expected: ty.to_string(),
                path: self.path(),
                location: self.location,
            }),
            (_, ConstValue::Null) => Ok(Value::Null),
            (BaseType::List(item), ConstValue::List(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, value) in items.into_iter().enumerate() {
                    self.value_path.push(index);
                    values.push(self.coerce_input_value(item, value)?);
                    self.value_path.pop();
                }
                Ok(Value::Sequence(values))
            }
            (BaseType::List(_), value) => Err(InputValueError::MissingList {
                actual: (&value).into(),
                expected: ty.to_string(),
                path: self.path(),
                location: self.location,
            }),
            (BaseType::Named(name), value) => {
                let Ok(scalar) = name.parse::<ScalarType>() else {
                    return Err(InputValueError::UnknownType {
                        name: name.clone(),
                        path: self.path(),
                        location: self.location,
                    });
                };
                self.coerce_scalar(scalar, value)
            }
        }
    }

    fn coerce_scalar(&mut self, scalar: ScalarType, value: ConstValue) -> Result<Value, InputValueError> {
        match (value, scalar) {
            (value, ScalarType::Json) => Ok(json_value(value)),
            (ConstValue::Number(number), ScalarType::Int) => {
                let int = number
                    .as_i64()
                    .or_else(|| number.as_f64().filter(|float| can_coerce_to_int(*float)).map(|float| float as i64));
                match int {
                    Some(int) => Ok(Value::Int(int)),
                    None => Err(self.incorrect_value(number.to_string(), scalar)),
                }
            }
            (ConstValue::Number(number), ScalarType::Float) => match number.as_f64() {
                Some(float) => Ok(Value::Float(float)),
                None => Err(self.incorrect_value(number.to_string(), scalar)),
            },
            (ConstValue::Number(number), ScalarType::Id) => match number.as_i64() {
                Some(int) => Ok(Value::String(int.to_string())),
                None => Err(self.incorrect_value(number.to_string(), scalar)),
            },
            (ConstValue::String(value), ScalarType::String | ScalarType::Id) => Ok(Value::String(value)),
            (ConstValue::Boolean(value), ScalarType::Boolean) => Ok(Value::Bool(value)),
            (actual, _) => Err(InputValueError::IncorrectScalarType {
                actual: (&actual).into(),
                expected: scalar.to_string(),
                path: self.path(),
                location: self.location,
            }),
        }
    }

    fn incorrect_value(&self, actual: String, scalar: ScalarType) -> InputValueError {
        InputValueError::IncorrectScalarValue {
            actual,
            expected: scalar.to_string(),
            path: self.path(),
            location: self.location,
        }
    }

    fn path(&self) -> ValuePath {
        ValuePath(self.value_path.clone())
    }
}

fn can_coerce_to_int(float: f64) -> bool {
    float.floor() == float && float < (i64::MAX as f64) && float >= (i64::MIN as f64)
}

/// `JSON` accepts anything, enum names being read as strings.
fn json_value(value: ConstValue) -> Value {
    match value {
        ConstValue::Null => Value::Null,
        ConstValue::Number(number) => match number.as_i64() {
            Some(int) => Value::Int(int),
            None => number.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        ConstValue::String(value) => Value::String(value),
        ConstValue::Boolean(value) => Value::Bool(value),
        ConstValue::Enum(name) => Value::String(name.to_string()),
        ConstValue::Binary(bytes) => Value::Sequence(bytes.iter().map(|byte| Value::Int(i64::from(*byte))).collect()),
        ConstValue::List(items) => Value::Sequence(items.into_iter().map(json_value).collect()),
        ConstValue::Object(fields) => Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), json_value(value)))
                .collect::<Record>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn coerce(ty: &str, value: serde_json::Value) -> Result<Value, InputValueError> {
        let value = ConstValue::from_json(value).unwrap();
        coerce_input_value(&ty.parse().unwrap(), value, Location::new(1, 1))
    }

    #[rstest]
    #[case("Int", serde_json::json!(3), Value::Int(3))]
    #[case("Int", serde_json::json!(3.0), Value::Int(3))]
    #[case("Float", serde_json::json!(3), Value::Float(3.0))]
    #[case("ID", serde_json::json!(7), Value::from("7"))]
    #[case("Boolean", serde_json::json!(true), Value::Bool(true))]
    #[case("[Int]", serde_json::json!(1), Value::from(vec![1]))]
    #[case("[[Int]]", serde_json::json!(1), Value::from(vec![vec![1]]))]
    #[case("[Int!]", serde_json::json!([1, 2]), Value::from(vec![1, 2]))]
    #[case("String", serde_json::Value::Null, Value::Null)]
    #[case("JSON", serde_json::json!({"a": [1, "b"]}), Value::record([("a", vec![Value::Int(1), "b".into()])]))]
    fn valid_inputs(#[case] ty: &str, #[case] input: serde_json::Value, #[case] expected: Value) {
        assert_eq!(coerce(ty, input), Ok(expected));
    }

    #[rstest]
    #[case("Int!", serde_json::Value::Null, "Found a null where we expected a Int!")]
    #[case("Int", serde_json::json!("1"), "Found a String value where we expected a Int scalar")]
    #[case("Int", serde_json::json!(1.5), "Found value 1.5 which cannot be coerced into a Int scalar")]
    #[case(
        "[Int!]",
        serde_json::json!([1, null]),
        "Found a null where we expected a Int! at path '.1'"
    )]
    #[case("[Int]", serde_json::json!({"a": 1}), "Found a Object value where we expected a Int scalar")]
    fn invalid_inputs(#[case] ty: &str, #[case] input: serde_json::Value, #[case] message: &str) {
        assert_eq!(coerce(ty, input).unwrap_err().to_string(), message);
    }
}
