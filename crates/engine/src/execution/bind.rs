use std::sync::Arc;

use async_graphql_parser::{
    types::{Directive, ExecutableDocument, Field, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::{ConstValue, Name, Value as InputValue};
use config::FieldOrder;
use indexmap::IndexMap;
use schema::{CompiledField, CompiledSchema, ObjectId, ScalarType};
use value::Record;

use super::{
    coercion::{coerce_input_value, InputValueError, InputValueKind},
    variables::Variables,
};
use crate::{ErrorCode, GraphqlError, Location};

#[derive(thiserror::Error, Debug)]
pub(crate) enum BindError {
    #[error("Unknown type named '{name}'")]
    UnknownType { name: String, location: Location },
    #[error("Type conditions cannot be declared on '{name}', only on objects.")]
    InvalidTypeConditionTargetType { name: String, location: Location },
    #[error("The field `{field_name}` does not have an argument named `{argument_name}`")]
    UnknownArgument {
        field_name: String,
        argument_name: String,
        location: Location,
    },
    #[error("{container} does not have a field named '{name}'")]
    UnknownField {
        container: String,
        name: String,
        location: Location,
    },
    #[error("Unknown fragment named '{name}'")]
    UnknownFragment { name: String, location: Location },
    #[error("Unknown variable named '${name}'")]
    UnknownVariable { name: String, location: Location },
    #[error("Field '{name}' cannot have a selection set, it's a {ty}. Only objects can.")]
    CannotHaveSelectionSet { name: String, ty: String, location: Location },
    #[error("Leaf field '{name}' must be a scalar, but is a {ty}.")]
    LeafMustBeAScalar { name: String, ty: String, location: Location },
    #[error("Fields '{response_key}' conflict because {reason}.")]
    FieldConflict {
        response_key: String,
        reason: String,
        location: Location,
    },
    #[error("{0}")]
    InvalidInputValue(#[from] InputValueError),
    #[error("Missing argument named '{name}' for field '{field}'")]
    MissingArgument {
        field: String,
        name: String,
        location: Location,
    },
    #[error("Missing argument named '{name}' for directive '{directive}'")]
    MissingDirectiveArgument {
        name: &'static str,
        directive: String,
        location: Location,
    },
    #[error("Mutations are not defined on this schema.")]
    NoMutationDefined,
    #[error("Subscriptions are not defined on this schema.")]
    NoSubscriptionDefined,
    #[error("Unknown operation named '{0}'.")]
    UnknownOperation(String),
    #[error("The document contains multiple operations, the operation name must be specified.")]
    MissingOperationName,
    #[error("The document does not contain any operation.")]
    NoOperation,
}

impl BindError {
    pub fn location(&self) -> Option<Location> {
        match self {
            BindError::UnknownType { location, .. }
            | BindError::InvalidTypeConditionTargetType { location, .. }
            | BindError::UnknownArgument { location, .. }
            | BindError::UnknownField { location, .. }
            | BindError::UnknownFragment { location, .. }
            | BindError::UnknownVariable { location, .. }
            | BindError::CannotHaveSelectionSet { location, .. }
            | BindError::LeafMustBeAScalar { location, .. }
            | BindError::FieldConflict { location, .. }
            | BindError::MissingArgument { location, .. }
            | BindError::MissingDirectiveArgument { location, .. } => Some(*location),
            BindError::InvalidInputValue(err) => Some(err.location()),
            BindError::NoMutationDefined
            | BindError::NoSubscriptionDefined
            | BindError::UnknownOperation(_)
            | BindError::MissingOperationName
            | BindError::NoOperation => None,
        }
    }
}

impl From<BindError> for GraphqlError {
    fn from(err: BindError) -> Self {
        let location = err.location();
        GraphqlError::new(err.to_string(), ErrorCode::OperationValidationError).with_locations(location)
    }
}

/// Fields selected on one object type, merged and with their arguments coerced.
#[derive(Debug)]
pub(crate) struct SelectionSetPlan {
    pub object: ObjectId,
    /// In response key order.
    pub fields: Vec<FieldPlan>,
}

#[derive(Debug)]
pub(crate) struct FieldPlan {
    pub response_key: String,
    pub location: Location,
    pub target: FieldTarget,
}

#[derive(Debug)]
pub(crate) enum FieldTarget {
    Typename,
    Field {
        name: String,
        arguments: Arc<Record>,
        /// Present for fields producing objects.
        selection_set: Option<SelectionSetPlan>,
    },
}

type GroupedFields<'a> = IndexMap<&'a str, Vec<&'a Positioned<Field>>>;

/// Binds a selection against the compiled schema. Only object types exist, so every selection
/// set binds to exactly one object and the whole operation to a static tree.
pub(crate) struct Binder<'a> {
    pub schema: &'a CompiledSchema,
    pub document: &'a ExecutableDocument,
    pub variables: &'a Variables,
    pub field_order: FieldOrder,
}

impl<'a> Binder<'a> {
    pub fn bind(&self, selection_set: &'a Positioned<SelectionSet>) -> Result<SelectionSetPlan, BindError> {
        self.bind_selection_sets(self.schema.query_id(), &[selection_set])
    }

    fn bind_selection_sets(
        &self,
        object: ObjectId,
        selection_sets: &[&'a Positioned<SelectionSet>],
    ) -> Result<SelectionSetPlan, BindError> {
        let mut grouped = GroupedFields::new();
        for selection_set in selection_sets {
            self.collect_fields(object, selection_set, &mut grouped)?;
        }

        let mut fields = Vec::with_capacity(grouped.len());
        for (response_key, group) in grouped {
            fields.push(self.bind_field(object, response_key, &group)?);
        }
        // Stable, so aliases of one field keep their selection order. `__typename` comes first.
        if self.field_order == FieldOrder::Schema {
            fields.sort_by_key(|(position, _)| *position);
        }

        Ok(SelectionSetPlan {
            object,
            fields: fields.into_iter().map(|(_, field)| field).collect(),
        })
    }

    fn collect_fields(
        &self,
        object: ObjectId,
        selection_set: &'a Positioned<SelectionSet>,
        grouped: &mut GroupedFields<'a>,
    ) -> Result<(), BindError> {
        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    if self.is_included(&field.node.directives)? {
                        grouped
                            .entry(field.node.response_key().node.as_str())
                            .or_default()
                            .push(field);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !self.is_included(&spread.node.directives)? {
                        continue;
                    }
                    let name = &spread.node.fragment_name;
                    let fragment = self
                        .document
                        .fragments
                        .get(&name.node)
                        .ok_or_else(|| BindError::UnknownFragment {
                            name: name.node.to_string(),
                            location: name.pos.into(),
                        })?;
                    if self.applies_to(object, &fragment.node.type_condition.node.on)?
                        && self.is_included(&fragment.node.directives)?
                    {
                        self.collect_fields(object, &fragment.node.selection_set, grouped)?;
                    }
                }
                Selection::InlineFragment(fragment) => {
                    if !self.is_included(&fragment.node.directives)? {
                        continue;
                    }
                    let applies = match &fragment.node.type_condition {
                        Some(condition) => self.applies_to(object, &condition.node.on)?,
                        None => true,
                    };
                    if applies {
                        self.collect_fields(object, &fragment.node.selection_set, grouped)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether a type condition selects `object`.
    fn applies_to(&self, object: ObjectId, condition: &Positioned<Name>) -> Result<bool, BindError> {
        let name = condition.node.as_str();
        if self.schema[object].name == name {
            Ok(true)
        } else if self.schema.object_by_name(name).is_some() {
            Ok(false)
        } else if name.parse::<ScalarType>().is_ok() {
            Err(BindError::InvalidTypeConditionTargetType {
                name: name.to_owned(),
                location: condition.pos.into(),
            })
        } else {
            Err(BindError::UnknownType {
                name: name.to_owned(),
                location: condition.pos.into(),
            })
        }
    }

    /// `@skip` and `@include`. Other directives have no effect.
    fn is_included(&self, directives: &[Positioned<Directive>]) -> Result<bool, BindError> {
        for directive in directives {
            let name = directive.node.name.node.as_str();
            let skip_if = match name {
                "skip" => true,
                "include" => false,
                _ => continue,
            };
            let Some(condition) = directive.node.get_argument("if") else {
                return Err(BindError::MissingDirectiveArgument {
                    name: "if",
                    directive: name.to_owned(),
                    location: directive.pos.into(),
                });
            };
            let location = Location::from(condition.pos);
            match self.resolve_variables(&condition.node, location)? {
                ConstValue::Boolean(value) if value == skip_if => return Ok(false),
                ConstValue::Boolean(_) => {}
                value => {
                    return Err(InputValueError::IncorrectScalarType {
                        actual: InputValueKind::from(&value),
                        expected: "Boolean!".into(),
                        path: Default::default(),
                        location,
                    }
                    .into())
                }
            }
        }
        Ok(true)
    }

    fn bind_field(
        &self,
        object: ObjectId,
        response_key: &str,
        group: &[&'a Positioned<Field>],
    ) -> Result<(Option<usize>, FieldPlan), BindError> {
        let Some((first, others)) = group.split_first() else {
            unreachable!("field groups are created with their first field");
        };
        let name = first.node.name.node.as_str();
        let location = Location::from(first.node.name.pos);

        for other in others {
            let reason = if other.node.name.node != first.node.name.node {
                format!("'{name}' and '{}' are different fields", other.node.name.node)
            } else if !same_arguments(&first.node, &other.node) {
                "they have differing arguments".to_owned()
            } else {
                continue;
            };
            return Err(BindError::FieldConflict {
                response_key: response_key.to_owned(),
                reason,
                location: other.node.name.pos.into(),
            });
        }

        let selection_sets = group
            .iter()
            .map(|field| &field.node.selection_set)
            .filter(|selection_set| !selection_set.node.items.is_empty())
            .collect::<Vec<_>>();

        if name == "__typename" {
            if !selection_sets.is_empty() {
                return Err(BindError::CannotHaveSelectionSet {
                    name: name.to_owned(),
                    ty: "String!".to_owned(),
                    location,
                });
            }
            let plan = FieldPlan {
                response_key: response_key.to_owned(),
                location,
                target: FieldTarget::Typename,
            };
            return Ok((None, plan));
        }

        let object_definition = &self.schema[object];
        let Some((position, _, field)) = object_definition.fields.get_full(name) else {
            return Err(BindError::UnknownField {
                container: object_definition.name.clone(),
                name: name.to_owned(),
                location,
            });
        };

        let arguments = self.bind_arguments(field, &first.node)?;
        let selection_set = match field.step.shape.object() {
            Some(_) if selection_sets.is_empty() => {
                return Err(BindError::LeafMustBeAScalar {
                    name: name.to_owned(),
                    ty: field.ty.to_string(),
                    location,
                })
            }
            Some(child) => Some(self.bind_selection_sets(child, &selection_sets)?),
            None if !selection_sets.is_empty() => {
                return Err(BindError::CannotHaveSelectionSet {
                    name: name.to_owned(),
                    ty: field.ty.to_string(),
                    location,
                })
            }
            None => None,
        };

        let plan = FieldPlan {
            response_key: response_key.to_owned(),
            location,
            target: FieldTarget::Field {
                name: name.to_owned(),
                arguments: Arc::new(arguments),
                selection_set,
            },
        };
        Ok((Some(position), plan))
    }

    /// Coerces the provided arguments and applies defaults. Arguments neither provided nor
    /// defaulted are left out of the record, so resolvers see them as absent.
    fn bind_arguments(&self, field: &CompiledField, ast: &Field) -> Result<Record, BindError> {
        if let Some((name, _)) = ast
            .arguments
            .iter()
            .find(|(name, _)| !field.arguments.contains_key(name.node.as_str()))
        {
            return Err(BindError::UnknownArgument {
                field_name: field.name.clone(),
                argument_name: name.node.to_string(),
                location: name.pos.into(),
            });
        }

        let mut arguments = Record::with_capacity(field.arguments.len());
        for (name, argument) in &field.arguments {
            let provided = ast
                .get_argument(name)
                .filter(|value| !self.is_unset_variable(&value.node));
            match provided {
                Some(value) => {
                    let location = Location::from(value.pos);
                    let value = self.resolve_variables(&value.node, location)?;
                    arguments.insert(name.clone(), coerce_input_value(&argument.ty, value, location)?);
                }
                None => {
                    if let Some(default) = &argument.default {
                        arguments.insert(name.clone(), default.clone());
                    } else if argument.ty.required {
                        return Err(BindError::MissingArgument {
                            field: field.name.clone(),
                            name: name.clone(),
                            location: ast.name.pos.into(),
                        });
                    }
                }
            }
        }
        Ok(arguments)
    }

    /// An argument given a variable that was neither provided nor defaulted counts as not given.
    fn is_unset_variable(&self, value: &InputValue) -> bool {
        matches!(
            value,
            InputValue::Variable(name) if self.variables.is_defined(name) && self.variables.get(name).is_none()
        )
    }

    fn resolve_variables(&self, value: &InputValue, location: Location) -> Result<ConstValue, BindError> {
        value.clone().into_const_with(|name| match self.variables.get(&name) {
            Some(value) => Ok(value.clone()),
            None if self.variables.is_defined(&name) => Ok(ConstValue::Null),
            None => Err(BindError::UnknownVariable {
                name: name.to_string(),
                location,
            }),
        })
    }
}

fn same_arguments(left: &Field, right: &Field) -> bool {
    left.arguments.len() == right.arguments.len()
        && left.arguments.iter().all(|(name, value)| {
            right
                .get_argument(name.node.as_str())
                .is_some_and(|other| other.node == value.node)
        })
}
