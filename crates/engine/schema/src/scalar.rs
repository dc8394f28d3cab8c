use remote::ValueType;
use value::Value;

/// Built-in scalars. Any named type that is not one of these must be a declared object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ScalarType {
    Int,
    Float,
    String,
    Boolean,
    #[strum(serialize = "ID")]
    #[serde(rename = "ID")]
    Id,
    #[strum(serialize = "JSON")]
    #[serde(rename = "JSON")]
    Json,
}

impl ScalarType {
    /// Type of the value an argument of this scalar holds once coerced.
    pub fn input_value_type(self) -> ValueType {
        match self {
            ScalarType::Int => ValueType::Int,
            ScalarType::Float => ValueType::Float,
            ScalarType::String | ScalarType::Id => ValueType::String,
            ScalarType::Boolean => ValueType::Bool,
            ScalarType::Json => ValueType::Any,
        }
    }

    /// Whether a resolver statically typed as `ty` can produce this scalar. `ty` must already be
    /// stripped of its optional layers.
    pub fn accepts_type(self, ty: &ValueType) -> bool {
        match (self, ty) {
            (ScalarType::Json, _) | (_, ValueType::Any) => true,
            (ScalarType::Int, ValueType::Int)
            | (ScalarType::Float, ValueType::Int | ValueType::Float)
            | (ScalarType::String, ValueType::String)
            | (ScalarType::Boolean, ValueType::Bool)
            | (ScalarType::Id, ValueType::Int | ValueType::String) => true,
            _ => false,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        self.serialize(value).is_some()
    }

    /// Output coercion: the value as it appears in a response, `None` when it isn't a valid
    /// instance of the scalar. `Int` widens to `Float`, and an `ID` renders as a string.
    pub fn serialize(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ScalarType::Json, value) => Some(value.clone()),
            (ScalarType::Int, Value::Int(_))
            | (ScalarType::Float, Value::Float(_))
            | (ScalarType::String | ScalarType::Id, Value::String(_))
            | (ScalarType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ScalarType::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
            (ScalarType::Id, Value::Int(n)) => Some(Value::String(n.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ScalarType::Int, Value::Int(1), Some(Value::Int(1)))]
    #[case(ScalarType::Float, Value::Int(1), Some(Value::Float(1.0)))]
    #[case(ScalarType::Id, Value::Int(7), Some(Value::String("7".into())))]
    #[case(ScalarType::Int, Value::Float(1.5), None)]
    #[case(ScalarType::String, Value::Bool(true), None)]
    #[case(ScalarType::Json, Value::record([("a", 1)]), Some(Value::record([("a", 1)])))]
    fn output_coercion(#[case] scalar: ScalarType, #[case] value: Value, #[case] expected: Option<Value>) {
        assert_eq!(scalar.serialize(&value), expected);
    }

    #[test]
    fn names() {
        assert_eq!("ID".parse::<ScalarType>(), Ok(ScalarType::Id));
        assert_eq!(ScalarType::Json.to_string(), "JSON");
        assert!("Id".parse::<ScalarType>().is_err());
    }
}
