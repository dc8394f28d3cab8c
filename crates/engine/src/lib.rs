//! Resolver engine.
//!
//! Fields of a schema are bound to [`remote::Remote`] expressions at build time. Those are
//! compiled once into steps by [`schema::StepGenerator`], and at query time the
//! [`EvaluationRuntime`] evaluates each step against the [`Context`] the executor threads
//! through the selection tree.

mod context;
mod engine;
mod execution;
mod response;
mod runtime;

pub use context::Context;
pub use engine::{Engine, Request};
pub use response::{ErrorCode, ErrorPath, ErrorPathSegment, GraphqlError, Location, Response};
pub use runtime::{EvalError, EvaluationRuntime};

pub use config::Config;
pub use remote::{Expression, Remote};
pub use schema::{
    ArgumentDefinition, CompileError, CompiledSchema, FieldDefinition, ObjectDefinition, SchemaDefinition,
    StepGenerator,
};
pub use value::{AbsentPolicy, Record, Value};
