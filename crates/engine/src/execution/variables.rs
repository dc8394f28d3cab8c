use std::collections::{HashMap, HashSet};

use async_graphql_parser::types::OperationDefinition;
use async_graphql_value::{ConstValue, Name};
use schema::{ScalarType, TypeRef};

use super::coercion::{coerce_input_value, InputValueError};
use crate::{ErrorCode, GraphqlError, Location};

#[derive(Debug, thiserror::Error)]
pub(crate) enum VariableError {
    #[error("Variable named '${name}' does not have a valid input type. Can only be a scalar. Found: '{ty}'.")]
    InvalidVariableType { name: String, ty: String, location: Location },
    #[error("Variable ${name} is missing")]
    MissingVariable { name: String, location: Location },
    #[error("Variable ${name} is not a valid GraphQL value")]
    InvalidJson { name: String, location: Location },
    #[error("Variable ${name} has an invalid value. {err}")]
    InvalidValue { name: String, err: InputValueError },
}

impl VariableError {
    pub fn location(&self) -> Location {
        match self {
            VariableError::InvalidVariableType { location, .. }
            | VariableError::MissingVariable { location, .. }
            | VariableError::InvalidJson { location, .. } => *location,
            VariableError::InvalidValue { err, .. } => err.location(),
        }
    }
}

impl From<VariableError> for GraphqlError {
    fn from(err: VariableError) -> Self {
        let code = match err {
            VariableError::InvalidVariableType { .. } => ErrorCode::OperationValidationError,
            _ => ErrorCode::VariableError,
        };
        let location = err.location();
        GraphqlError::new(err.to_string(), code).with_location(location)
    }
}

/// Variables of the executed operation, as literals ready to be substituted into arguments.
#[derive(Debug, Default)]
pub(crate) struct Variables {
    values: HashMap<Name, ConstValue>,
    defined: HashSet<Name>,
}

impl Variables {
    /// `None` for a variable that was neither provided nor defaulted.
    pub fn get(&self, name: &Name) -> Option<&ConstValue> {
        self.values.get(name)
    }

    pub fn is_defined(&self, name: &Name) -> bool {
        self.defined.contains(name)
    }
}

/// Checks the provided variables against the operation's definitions, applying defaults.
pub(crate) fn coerce_variables(
    operation: &OperationDefinition,
    provided: &serde_json::Map<String, serde_json::Value>,
) -> Result<Variables, Vec<VariableError>> {
    let mut variables = Variables::default();
    let mut errors = Vec::new();

    for definition in &operation.variable_definitions {
        let name = &definition.node.name.node;
        let location = Location::from(definition.node.name.pos);
        let ty = TypeRef::from(definition.node.var_type.node.clone());

        if ty.named_type().parse::<ScalarType>().is_err() {
            errors.push(VariableError::InvalidVariableType {
                name: name.to_string(),
                ty: ty.to_string(),
                location,
            });
            continue;
        }
        variables.defined.insert(name.clone());

        let value = match provided.get(name.as_str()) {
            Some(json) => match ConstValue::from_json(json.clone()) {
                Ok(value) => value,
                Err(_) => {
                    errors.push(VariableError::InvalidJson {
                        name: name.to_string(),
                        location,
                    });
                    continue;
                }
            },
            None => match &definition.node.default_value {
                Some(default) => default.node.clone(),
                None if ty.required => {
                    errors.push(VariableError::MissingVariable {
                        name: name.to_string(),
                        location,
                    });
                    continue;
                }
                None => continue,
            },
        };

        match coerce_input_value(&ty, value.clone(), location) {
            Ok(_) => {
                variables.values.insert(name.clone(), value);
            }
            Err(err) => errors.push(VariableError::InvalidValue {
                name: name.to_string(),
                err,
            }),
        }
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn coerce(query: &str, provided: serde_json::Value) -> Result<Variables, Vec<String>> {
        let document = async_graphql_parser::parse_query(query).unwrap();
        let (_, operation) = document.operations.iter().next().unwrap();
        let serde_json::Value::Object(provided) = provided else {
            unreachable!()
        };
        coerce_variables(&operation.node, &provided).map_err(|errors| errors.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn defaults_and_absent_variables() {
        let variables = coerce("query($a: Int = 3, $b: String) { f }", json!({})).unwrap();

        assert_eq!(variables.get(&Name::new("a")), Some(&ConstValue::Number(3.into())));
        assert_eq!(variables.get(&Name::new("b")), None);
        assert!(variables.is_defined(&Name::new("b")));
        assert!(!variables.is_defined(&Name::new("c")));
    }

    #[test]
    fn errors() {
        let errors = coerce(
            "query($a: Int!, $b: [Int!], $c: Foo) { f }",
            json!({ "b": [1, "two"] }),
        )
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Variable $a is missing",
                "Variable $b has an invalid value. Found a String value where we expected a Int scalar at path '.1'",
                "Variable named '$c' does not have a valid input type. Can only be a scalar. Found: 'Foo'.",
            ]
        );
    }
}
