//! Schema authoring and resolver compilation.
//!
//! A [`SchemaDefinition`] lists object types and their fields, each field bound to nothing
//! (passthrough), a constant or a [`remote::Remote`] expression. [`StepGenerator`] turns it into
//! a [`CompiledSchema`]: one immutable [`Step`] per field, shared by every execution.

mod compiled;
mod definition;
mod error;
mod generator;
mod ids;
mod scalar;
mod step;
mod type_ref;

pub use compiled::{CompiledArgument, CompiledField, CompiledObject, CompiledSchema};
pub use definition::{
    ArgumentDefinition, Binding, FieldDefinition, ObjectDefinition, SchemaDefinition, SchemaDefinitionBuilder,
};
pub use error::CompileError;
pub use generator::StepGenerator;
pub use ids::ObjectId;
pub use scalar::ScalarType;
pub use step::{Shape, ShapeKind, Step, StepKind};
pub use type_ref::{BaseType, TypeRef, TypeRefError};
