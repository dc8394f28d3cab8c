use serde_json::{Map, Number};

use crate::{Record, Value};

/// How `Optional(absent)` renders once a value is projected to JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Absent renders as the `null` literal.
    #[default]
    Null,
    /// Absent record entries are left out. Absent list items still render as `null` since a list
    /// can't have holes.
    Omit,
}

impl Value {
    /// Integers become `Int`, any other number `Float`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Value::Int(value),
                None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => Value::String(value),
            serde_json::Value::Array(items) => Value::Sequence(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Pure projection of the value tree: records become objects (key order kept), sequences
    /// arrays, present optionals their content. Non-finite floats have no JSON representation
    /// and become `null`.
    pub fn to_json(&self, policy: AbsentPolicy) -> serde_json::Value {
        match self {
            Value::Null | Value::Optional(None) => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::Number(Number::from(*value)),
            Value::Float(value) => Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(value) => serde_json::Value::String(value.clone()),
            Value::Record(record) => serde_json::Value::Object(record_to_json(record, policy)),
            Value::Sequence(items) => serde_json::Value::Array(items.iter().map(|item| item.to_json(policy)).collect()),
            Value::Optional(Some(value)) => value.to_json(policy),
        }
    }

    pub fn to_json_string(&self, policy: AbsentPolicy) -> String {
        self.to_json(policy).to_string()
    }
}

fn record_to_json(record: &Record, policy: AbsentPolicy) -> Map<String, serde_json::Value> {
    record
        .iter()
        .filter(|(_, value)| !(policy == AbsentPolicy::Omit && value.is_absent()))
        .map(|(key, value)| (key.to_owned(), value.to_json(policy)))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn projection_keeps_record_order() {
        let value = Value::record([("b", Value::Int(2)), ("a", Value::Float(1.5))]);
        assert_eq!(value.to_json_string(AbsentPolicy::Null), r#"{"b":2,"a":1.5}"#);
    }

    #[test]
    fn absent_rendering_follows_policy() {
        let value = Value::record([
            ("a", Value::present(1)),
            ("b", Value::absent()),
            ("c", Value::from(vec![Value::absent()])),
        ]);
        assert_eq!(value.to_json_string(AbsentPolicy::Null), r#"{"a":1,"b":null,"c":[null]}"#);
        assert_eq!(value.to_json_string(AbsentPolicy::Omit), r#"{"a":1,"c":[null]}"#);
    }

    #[test]
    fn json_numbers_split_into_int_and_float() {
        let value = Value::from_json(json!({"int": 100, "float": 2.5, "list": [true, null]}));
        assert_eq!(
            value,
            Value::record([
                ("int", Value::Int(100)),
                ("float", Value::Float(2.5)),
                ("list", Value::Sequence(vec![Value::Bool(true), Value::Null])),
            ])
        );
    }

    #[test]
    fn display_renders_json() {
        assert_eq!(Value::from(vec![1, 2, 3]).to_string(), "[1,2,3]");
    }
}
