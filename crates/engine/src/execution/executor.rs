use std::{fmt, sync::Arc};

use schema::{CompiledObject, CompiledSchema, Shape, ShapeKind};
use value::{Record, Value};

use super::bind::{FieldPlan, FieldTarget, SelectionSetPlan};
use crate::{Context, ErrorCode, ErrorPathSegment, EvaluationRuntime, GraphqlError, Location};

/// A null reached a non-null position. The error explaining it was already recorded; the
/// nearest nullable ancestor becomes null.
struct NullPropagation;

/// Walks a bound operation, evaluating each field's step and completing the result against its
/// shape.
pub(crate) struct Executor<'a> {
    schema: &'a CompiledSchema,
    runtime: &'a EvaluationRuntime,
    path: Vec<ErrorPathSegment>,
    errors: Vec<GraphqlError>,
}

/// What completion needs to know about the field whose value it completes.
struct FieldSite<'s> {
    object: &'s str,
    field: &'s str,
    location: Location,
    selection_set: Option<&'s SelectionSetPlan>,
    /// Context the field was resolved in. Objects it produces get it as their parent.
    context: &'s Arc<Context>,
}

impl fmt::Display for FieldSite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.field)
    }
}

impl<'a> Executor<'a> {
    pub fn new(schema: &'a CompiledSchema, runtime: &'a EvaluationRuntime) -> Self {
        Executor {
            schema,
            runtime,
            path: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn execute(mut self, plan: &SelectionSetPlan, root: &Arc<Context>) -> (Value, Vec<GraphqlError>) {
        let data = match self.execute_selection_set(plan, root) {
            Ok(record) => Value::Record(record),
            Err(NullPropagation) => Value::Null,
        };
        (data, self.errors)
    }

    fn execute_selection_set(
        &mut self,
        plan: &SelectionSetPlan,
        context: &Arc<Context>,
    ) -> Result<Record, NullPropagation> {
        let object = &self.schema[plan.object];
        let mut record = Record::with_capacity(plan.fields.len());
        for field in &plan.fields {
            self.path.push(ErrorPathSegment::Field(field.response_key.clone()));
            let value = self.execute_field(object, field, context);
            self.path.pop();
            record.insert(field.response_key.clone(), value?);
        }
        Ok(record)
    }

    fn execute_field(
        &mut self,
        object: &CompiledObject,
        plan: &FieldPlan,
        context: &Arc<Context>,
    ) -> Result<Value, NullPropagation> {
        let FieldTarget::Field {
            name,
            arguments,
            selection_set,
        } = &plan.target
        else {
            return Ok(Value::String(object.name.clone()));
        };

        let Some(field) = object.fields.get(name) else {
            self.push_error(GraphqlError::internal_server_error(), plan.location);
            return Ok(Value::Null);
        };

        let site = FieldSite {
            object: &object.name,
            field: name,
            location: plan.location,
            selection_set: selection_set.as_ref(),
            context,
        };
        let shape = &field.step.shape;

        match self
            .runtime
            .evaluate_step(&field.step.kind, &context.with_args(Arc::clone(arguments)))
        {
            Ok(value) => self.complete(value, shape, &site),
            Err(err) => {
                tracing::debug!(field = %site, error = %err, "resolver failed");
                self.fail(err.to_string(), shape, &site)
            }
        }
    }

    fn complete(&mut self, value: Value, shape: &Shape, site: &FieldSite<'_>) -> Result<Value, NullPropagation> {
        let value = match value {
            Value::Optional(Some(inner)) => return self.complete(*inner, shape, site),
            // Absent stays absent, so it can be omitted from the response.
            Value::Optional(None) | Value::Null => return self.complete_null(value, shape, site),
            value => value,
        };

        match &shape.kind {
            ShapeKind::Scalar(scalar) => match scalar.serialize(&value) {
                Some(value) => Ok(value),
                None => self.fail(
                    format!("{site} produced a {} where {scalar} was expected", value.kind()),
                    shape,
                    site,
                ),
            },
            ShapeKind::Object(_) => {
                if let Value::Sequence(_) = value {
                    return self.fail(
                        format!("{site} produced a list where an object was expected"),
                        shape,
                        site,
                    );
                }
                let Some(plan) = site.selection_set else {
                    self.push_error(GraphqlError::internal_server_error(), site.location);
                    return self.nullable(shape);
                };
                let child = Arc::new(Context::child(site.context, value));
                match self.execute_selection_set(plan, &child) {
                    Ok(record) => Ok(Value::Record(record)),
                    Err(NullPropagation) => self.nullable(shape),
                }
            }
            ShapeKind::List(item) => {
                let Value::Sequence(items) = value else {
                    return self.fail(
                        format!("{site} produced a {} where a list was expected", value.kind()),
                        shape,
                        site,
                    );
                };
                let mut values = Vec::with_capacity(items.len());
                for (index, element) in items.into_iter().enumerate() {
                    self.path.push(ErrorPathSegment::Index(index));
                    let completed = self.complete(element, item, site);
                    self.path.pop();
                    match completed {
                        Ok(value) => values.push(value),
                        Err(NullPropagation) => return self.nullable(shape),
                    }
                }
                Ok(Value::Sequence(values))
            }
        }
    }

    fn complete_null(&mut self, null: Value, shape: &Shape, site: &FieldSite<'_>) -> Result<Value, NullPropagation> {
        if shape.required {
            self.push_error(
                GraphqlError::new(
                    format!("Cannot return null for non-nullable field {site}"),
                    ErrorCode::ResolverError,
                ),
                site.location,
            );
            Err(NullPropagation)
        } else {
            Ok(null)
        }
    }

    /// Records a field error, the value becoming null.
    fn fail(&mut self, message: String, shape: &Shape, site: &FieldSite<'_>) -> Result<Value, NullPropagation> {
        self.push_error(GraphqlError::new(message, ErrorCode::ResolverError), site.location);
        self.nullable(shape)
    }

    fn nullable(&self, shape: &Shape) -> Result<Value, NullPropagation> {
        if shape.required {
            Err(NullPropagation)
        } else {
            Ok(Value::Null)
        }
    }

    fn push_error(&mut self, error: GraphqlError, location: Location) {
        self.errors
            .push(error.with_location(location).with_path(self.path.clone()));
    }
}
