use indexmap::IndexMap;
use remote::{Expression, PathRoot, ValueType};
use value::Value;

use crate::{
    definition::{ArgumentDefinition, Binding, FieldDefinition, ObjectDefinition},
    BaseType, CompileError, CompiledArgument, CompiledField, CompiledObject, CompiledSchema, ObjectId,
    SchemaDefinition, ScalarType, Shape, ShapeKind, Step, StepKind, TypeRef,
};

/// Compiles every field of a [`SchemaDefinition`] into a [`Step`].
///
/// All structural checks happen here, eagerly: unknown types, resolvers whose static result
/// can't fit the declared field type, argument paths that don't match declared arguments and
/// context paths that don't lower.
pub struct StepGenerator<'a> {
    definition: &'a SchemaDefinition,
}

impl<'a> StepGenerator<'a> {
    pub fn new(definition: &'a SchemaDefinition) -> Self {
        StepGenerator { definition }
    }

    pub fn generate(self) -> Result<CompiledSchema, CompileError> {
        let query = self
            .object_id(&self.definition.query)
            .ok_or_else(|| CompileError::MissingQueryType(self.definition.query.clone()))?;

        let objects = self
            .definition
            .objects
            .values()
            .map(|object| self.compile_object(object))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledSchema { query, objects })
    }

    fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.definition.objects.get_index_of(name).map(ObjectId::from)
    }

    fn compile_object(&self, object: &ObjectDefinition) -> Result<CompiledObject, CompileError> {
        let fields = object
            .fields
            .iter()
            .map(|(name, field)| {
                let location = format!("{}.{name}", object.name);
                let compiled = self.compile_field(name, field, &location)?;
                tracing::debug!(%location, step = %compiled.step.kind, "compiled field");
                Ok((name.clone(), compiled))
            })
            .collect::<Result<IndexMap<_, _>, CompileError>>()?;

        Ok(CompiledObject {
            name: object.name.clone(),
            fields,
        })
    }

    fn compile_field(
        &self,
        name: &str,
        field: &FieldDefinition,
        location: &str,
    ) -> Result<CompiledField, CompileError> {
        let ty = parse_type(&field.ty, location)?;
        let shape = self.shape(&ty, location)?;

        let arguments = field
            .arguments
            .iter()
            .map(|(argument_name, argument)| {
                let location = format!("{location}({argument_name})");
                Ok((argument_name.clone(), compile_argument(argument, &location)?))
            })
            .collect::<Result<IndexMap<_, _>, CompileError>>()?;

        let kind = match &field.binding {
            Binding::NoResolver => StepKind::Passthrough { key: name.to_owned() },
            Binding::Constant(value) => {
                check_constant(value, &shape, &ty, location)?;
                StepKind::Constant(value.clone())
            }
            Binding::Expression { expr, output } => {
                check_output(output, &shape, &ty, location)?;
                let expression = expr.materialize().map_err(|err| CompileError::InvalidPath {
                    location: location.to_owned(),
                    err,
                })?;
                check_argument_paths(&expression, &arguments, location)?;
                StepKind::Computed(expression)
            }
        };

        Ok(CompiledField {
            name: name.to_owned(),
            ty,
            arguments,
            step: Step { kind, shape },
        })
    }

    fn shape(&self, ty: &TypeRef, location: &str) -> Result<Shape, CompileError> {
        let kind = match &ty.base {
            BaseType::Named(name) => {
                if let Ok(scalar) = name.parse::<ScalarType>() {
                    ShapeKind::Scalar(scalar)
                } else if let Some(id) = self.object_id(name) {
                    ShapeKind::Object(id)
                } else {
                    return Err(CompileError::UnknownType {
                        location: location.to_owned(),
                        name: name.clone(),
                    });
                }
            }
            BaseType::List(item) => ShapeKind::List(Box::new(self.shape(item, location)?)),
        };

        Ok(Shape {
            kind,
            required: ty.required,
        })
    }
}

fn parse_type(ty: &str, location: &str) -> Result<TypeRef, CompileError> {
    ty.parse().map_err(|err| CompileError::InvalidTypeRef {
        location: location.to_owned(),
        err,
    })
}

fn compile_argument(argument: &ArgumentDefinition, location: &str) -> Result<CompiledArgument, CompileError> {
    let ty = parse_type(&argument.ty, location)?;
    if ty.named_type().parse::<ScalarType>().is_err() {
        return Err(CompileError::InvalidArgumentType {
            location: location.to_owned(),
            ty: ty.to_string(),
        });
    }

    Ok(CompiledArgument {
        ty,
        default: argument.default.clone(),
    })
}

fn check_constant(value: &Value, shape: &Shape, ty: &TypeRef, location: &str) -> Result<(), CompileError> {
    // Null and absent complete to null, which the executor reports if the field is non-null.
    let Some(value) = value.as_present() else {
        return Ok(());
    };

    let shape_mismatch = || CompileError::ShapeMismatch {
        location: location.to_owned(),
        expected: ty.to_string(),
        found: value.kind().to_string(),
    };

    match (&shape.kind, value) {
        (_, Value::Null) => Ok(()),
        (ShapeKind::List(item), Value::Sequence(items)) => items
            .iter()
            .try_for_each(|value| check_constant(value, item, ty, location)),
        (ShapeKind::List(_), _) => Err(shape_mismatch()),
        (ShapeKind::Scalar(ScalarType::Json), _) => Ok(()),
        (_, Value::Sequence(_)) => Err(shape_mismatch()),
        (ShapeKind::Object(_), _) => Ok(()),
        (ShapeKind::Scalar(_), Value::Record(_)) => Err(shape_mismatch()),
        (ShapeKind::Scalar(scalar), value) if scalar.accepts(value) => Ok(()),
        (ShapeKind::Scalar(scalar), value) => Err(CompileError::ScalarTypeMismatch {
            location: location.to_owned(),
            expected: *scalar,
            found: value.kind().to_string(),
        }),
    }
}

fn check_output(output: &ValueType, shape: &Shape, ty: &TypeRef, location: &str) -> Result<(), CompileError> {
    let output = output.strip_optional();
    let shape_mismatch = || CompileError::ShapeMismatch {
        location: location.to_owned(),
        expected: ty.to_string(),
        found: output.to_string(),
    };

    match (&shape.kind, output) {
        (_, ValueType::Any) => Ok(()),
        (ShapeKind::List(item), ValueType::Sequence(output)) => check_output(output, item, ty, location),
        (ShapeKind::List(_), _) => Err(shape_mismatch()),
        (ShapeKind::Scalar(ScalarType::Json), _) => Ok(()),
        (_, ValueType::Sequence(_)) => Err(shape_mismatch()),
        (ShapeKind::Object(_), _) => Ok(()),
        (ShapeKind::Scalar(_), ValueType::Record) => Err(shape_mismatch()),
        (ShapeKind::Scalar(scalar), output) if scalar.accepts_type(output) => Ok(()),
        (ShapeKind::Scalar(scalar), output) => Err(CompileError::ScalarTypeMismatch {
            location: location.to_owned(),
            expected: *scalar,
            found: output.to_string(),
        }),
    }
}

/// Every `args` path must start with a declared argument, and a path reading the argument
/// itself must expect the type the argument coerces to.
fn check_argument_paths(
    expression: &Expression,
    arguments: &IndexMap<String, CompiledArgument>,
    location: &str,
) -> Result<(), CompileError> {
    for path in expression.context_paths() {
        if path.root != PathRoot::Args {
            continue;
        }
        let Some(first) = path.segments.first() else {
            continue;
        };
        let argument = first
            .as_key()
            .and_then(|name| arguments.get(name))
            .ok_or_else(|| CompileError::UnknownArgument {
                location: location.to_owned(),
                argument: first.to_string(),
            })?;

        if path.segments.len() == 1 && !input_matches(&argument.ty, path.expected.strip_optional()) {
            return Err(CompileError::ArgumentTypeMismatch {
                location: location.to_owned(),
                argument: first.to_string(),
                declared: argument.ty.to_string(),
                found: path.expected.to_string(),
            });
        }
    }

    Ok(())
}

fn input_matches(ty: &TypeRef, expected: &ValueType) -> bool {
    match (&ty.base, expected) {
        (_, ValueType::Any) => true,
        (BaseType::List(item), ValueType::Sequence(expected)) => input_matches(item, expected.strip_optional()),
        (BaseType::List(_), _) | (_, ValueType::Sequence(_)) => false,
        (BaseType::Named(name), expected) => name
            .parse::<ScalarType>()
            .map(|scalar| {
                let input = scalar.input_value_type();
                input == ValueType::Any || &input == expected
            })
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use remote::{MaterializeError, Remote};
    use value::Record;

    use super::*;

    fn compile(object: ObjectDefinition) -> Result<CompiledSchema, CompileError> {
        SchemaDefinition::builder("Query")
            .object(object)
            .object(ObjectDefinition::new("Bar").field("value", FieldDefinition::new("Int")))
            .build()
            .compile()
    }

    fn query(field: FieldDefinition) -> Result<CompiledSchema, CompileError> {
        compile(ObjectDefinition::new("Query").field("f", field))
    }

    #[test]
    fn passthrough_reads_own_name() {
        let schema = query(FieldDefinition::new("Int")).unwrap();
        let step = &schema.field("Query", "f").unwrap().step;
        assert_eq!(step.kind.to_string(), "passthrough f");
        assert_eq!(step.kind, StepKind::Passthrough { key: "f".into() });
    }

    #[test]
    fn shapes() {
        let schema = query(FieldDefinition::new("[Bar!]!")).unwrap();
        let shape = &schema.field("Query", "f").unwrap().step.shape;
        assert!(shape.required && shape.is_list());
        assert_eq!(shape.object().map(|id| schema[id].name.as_str()), Some("Bar"));
    }

    #[test]
    fn sum_of_arguments() {
        let schema = query(
            FieldDefinition::new("Int")
                .argument("a", "Int")
                .argument("b", "Int")
                .resolve(Remote::<i64>::args(["a"]) + Remote::<i64>::args(["b"])),
        )
        .unwrap();
        assert_eq!(
            schema.field("Query", "f").unwrap().step.kind.to_string(),
            "computed (args.a + args.b)"
        );
    }

    #[test]
    fn missing_query_type() {
        let err = SchemaDefinition::builder("Root").build().compile().unwrap_err();
        assert_eq!(err.to_string(), "The query type 'Root' is not declared");
    }

    #[test]
    fn unknown_type() {
        let err = query(FieldDefinition::new("[Baz]")).unwrap_err();
        assert_eq!(err.to_string(), "At Query.f, unknown type 'Baz'");
    }

    #[test]
    fn sequence_resolver_on_a_non_list_field() {
        let err = query(FieldDefinition::new("Bar").resolve(Remote::<Vec<i64>>::current(["xs"]))).unwrap_err();
        insta::assert_snapshot!(err, @"At Query.f, the resolver produces [Int] but the field is declared as Bar");
    }

    #[test]
    fn scalar_resolver_on_a_list_field() {
        let err = query(FieldDefinition::new("[Int]").constant(3)).unwrap_err();
        insta::assert_snapshot!(err, @"At Query.f, the resolver produces Int but the field is declared as [Int]");
    }

    #[test]
    fn wrong_scalar_constant() {
        let err = query(FieldDefinition::new("Int").constant("three")).unwrap_err();
        insta::assert_snapshot!(err, @"At Query.f, the resolver produces String which can't be returned as Int");
    }

    #[test]
    fn wrong_scalar_in_constant_list() {
        let err = query(FieldDefinition::new("[Int]").constant(vec![Value::Int(1), Value::Bool(true)])).unwrap_err();
        assert!(matches!(err, CompileError::ScalarTypeMismatch { expected: ScalarType::Int, .. }));
    }

    #[test]
    fn optional_resolver_fits_nullable_field() {
        query(FieldDefinition::new("Int").resolve(Remote::<Option<i64>>::current(["x"]))).unwrap();
        query(FieldDefinition::new("[Bar]").resolve(Remote::<Vec<Value>>::current(["x"]))).unwrap();
        query(FieldDefinition::new("Float").resolve(Remote::<i64>::current(["x"]))).unwrap();
        query(FieldDefinition::new("JSON").resolve(Remote::<Record>::current(["x"]))).unwrap();
    }

    #[test]
    fn unknown_argument() {
        let err =
            query(FieldDefinition::new("Int").argument("a", "Int").resolve(Remote::<i64>::args(["b"]))).unwrap_err();
        insta::assert_snapshot!(err, @"At Query.f, the resolver reads the undeclared argument 'b'");
    }

    #[test]
    fn argument_type_contradiction() {
        let err = query(FieldDefinition::new("String").argument("a", "Int").resolve(Remote::<String>::args(["a"])))
            .unwrap_err();
        insta::assert_snapshot!(
            err,
            @"At Query.f, the resolver reads the argument 'a' as String but it is declared as Int"
        );
    }

    #[test]
    fn object_arguments_are_rejected() {
        let err = query(FieldDefinition::new("Int").argument("bar", "Bar")).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidArgumentType {
                location: "Query.f(bar)".into(),
                ty: "Bar".into()
            }
        );
    }

    #[test]
    fn invalid_path() {
        let err = query(FieldDefinition::new("Int").resolve(Remote::<i64>::path(["parent"]))).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidPath {
                location: "Query.f".into(),
                err: MaterializeError::IncompletePath("parent".into())
            }
        );
    }

    #[test]
    fn last_declaration_is_compiled() {
        let schema = compile(
            ObjectDefinition::new("Query")
                .field("f", FieldDefinition::new("Int").constant(1))
                .field("g", FieldDefinition::new("Int"))
                .field("f", FieldDefinition::new("Int").constant(2)),
        )
        .unwrap();
        let query = schema.query();
        assert_eq!(query.fields.keys().collect::<Vec<_>>(), ["f", "g"]);
        assert_eq!(query.fields["f"].step.kind, StepKind::Constant(Value::Int(2)));
    }

    #[test]
    fn compiled_schema_is_portable() {
        let schema = query(
            FieldDefinition::new("[Int]")
                .argument("n", ArgumentDefinition::new("Int!").default_value(2))
                .resolve(Remote::<Vec<i64>>::current(["xs"]).map_each(|x| x * Remote::args(["n"]))),
        )
        .unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        let back: CompiledSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
