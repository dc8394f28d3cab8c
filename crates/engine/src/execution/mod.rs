mod bind;
mod coercion;
mod executor;
mod validation;
mod variables;

use std::sync::Arc;

use async_graphql_parser::{
    types::{ExecutableDocument, OperationDefinition, OperationType},
    Positioned,
};
use config::Config;
use schema::CompiledSchema;
use value::{Record, Value};

use self::{bind::BindError, executor::Executor};
use crate::{Context, ErrorCode, EvaluationRuntime, GraphqlError, Location, Response};

/// Everything an execution needs besides the query itself.
pub(crate) struct ExecutionContext<'a> {
    pub schema: &'a CompiledSchema,
    pub config: &'a Config,
    pub runtime: &'a EvaluationRuntime,
}

pub(crate) struct Operation<'a> {
    pub query: &'a str,
    pub operation_name: Option<&'a str>,
    pub variables: &'a serde_json::Map<String, serde_json::Value>,
    pub root_value: Value,
    pub env: Arc<Record>,
}

impl ExecutionContext<'_> {
    pub fn execute(&self, operation: Operation<'_>) -> Response {
        let document = match async_graphql_parser::parse_query(operation.query) {
            Ok(document) => document,
            Err(err) => {
                let error = GraphqlError::new(err.to_string(), ErrorCode::OperationParsingError)
                    .with_locations(err.positions().map(Location::from));
                return Response::request_error([error]);
            }
        };

        let definition = match select_operation(&document, operation.operation_name) {
            Ok(definition) => definition,
            Err(err) => return Response::request_error([err.into()]),
        };

        let selection_set = &definition.node.selection_set;
        if let Err(err) = validation::validate(&document, selection_set, self.config.execution.max_depth) {
            let location = err.location();
            let error =
                GraphqlError::new(err.to_string(), ErrorCode::OperationValidationError).with_location(location);
            return Response::request_error([error]);
        }

        let variables = match variables::coerce_variables(&definition.node, operation.variables) {
            Ok(variables) => variables,
            Err(errors) => return Response::request_error(errors.into_iter().map(Into::into)),
        };

        let binder = bind::Binder {
            schema: self.schema,
            document: &document,
            variables: &variables,
            field_order: self.config.response.field_order,
        };
        let plan = match binder.bind(selection_set) {
            Ok(plan) => plan,
            Err(err) => return Response::request_error([err.into()]),
        };

        let root = Arc::new(Context::root(operation.root_value, operation.env));
        let (data, errors) = Executor::new(self.schema, self.runtime).execute(&plan, &root);
        tracing::debug!(errors = errors.len(), "executed operation");

        Response::executed(data, errors, self.config.response.absent_fields)
    }
}

fn select_operation<'d>(
    document: &'d ExecutableDocument,
    name: Option<&str>,
) -> Result<&'d Positioned<OperationDefinition>, BindError> {
    let operation = match name {
        Some(name) => document
            .operations
            .iter()
            .find(|(operation_name, _)| operation_name.is_some_and(|operation_name| operation_name.as_str() == name))
            .map(|(_, operation)| operation)
            .ok_or_else(|| BindError::UnknownOperation(name.to_owned()))?,
        None => {
            let mut operations = document.operations.iter();
            match (operations.next(), operations.next()) {
                (Some((_, operation)), None) => operation,
                (None, _) => return Err(BindError::NoOperation),
                (Some(_), Some(_)) => return Err(BindError::MissingOperationName),
            }
        }
    };

    match operation.node.ty {
        OperationType::Query => Ok(operation),
        OperationType::Mutation => Err(BindError::NoMutationDefined),
        OperationType::Subscription => Err(BindError::NoSubscriptionDefined),
    }
}
