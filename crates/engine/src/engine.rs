use std::sync::Arc;

use config::Config;
use schema::{CompileError, CompiledSchema, SchemaDefinition, StepGenerator};
use value::{Record, Value};

use crate::{
    execution::{ExecutionContext, Operation},
    EvaluationRuntime, Response,
};

/// A compiled schema ready to execute queries.
///
/// Compilation happens once in [`Engine::new`]. Executions only read the engine, so a single
/// instance can be shared across threads and run any number of queries concurrently.
pub struct Engine {
    schema: Arc<CompiledSchema>,
    config: Config,
    runtime: EvaluationRuntime,
    env: Arc<Record>,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Current value of the root context, an empty record by default.
    pub root_value: Value,
    /// Overrides the configured `[env]` entries of the same name.
    pub env: Record,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            operation_name: None,
            variables: serde_json::Map::new(),
            root_value: Value::Record(Record::new()),
            env: Record::new(),
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Anything but a JSON object is ignored.
    #[must_use]
    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        if let serde_json::Value::Object(variables) = variables {
            self.variables = variables;
        }
        self
    }

    #[must_use]
    pub fn root_value(mut self, value: impl Into<Value>) -> Self {
        self.root_value = value.into();
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key, value);
        self
    }
}

impl Engine {
    pub fn new(definition: SchemaDefinition, config: Config) -> Result<Self, CompileError> {
        let schema = StepGenerator::new(&definition).generate()?;
        tracing::debug!(objects = schema.objects().count(), "compiled schema");
        Ok(Self::from_compiled(schema, config))
    }

    /// From a schema compiled earlier, possibly deserialized.
    pub fn from_compiled(schema: CompiledSchema, config: Config) -> Self {
        Engine {
            schema: Arc::new(schema),
            runtime: EvaluationRuntime::new(config.debug.level),
            env: Arc::new(config.env_record()),
            config,
        }
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    pub fn runtime(&self) -> &EvaluationRuntime {
        &self.runtime
    }

    pub fn execute(&self, request: Request) -> Response {
        let span = tracing::info_span!("execute", operation_name = request.operation_name.as_deref());
        let _guard = span.enter();

        let env = if request.env.is_empty() {
            Arc::clone(&self.env)
        } else {
            let mut env = Record::clone(&self.env);
            env.extend(request.env);
            Arc::new(env)
        };

        ExecutionContext {
            schema: &self.schema,
            config: &self.config,
            runtime: &self.runtime,
        }
        .execute(Operation {
            query: &request.query,
            operation_name: request.operation_name.as_deref(),
            variables: &request.variables,
            root_value: request.root_value,
            env,
        })
    }
}
