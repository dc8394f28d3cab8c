use remote::MaterializeError;

use crate::ScalarType;

/// Structural schema errors, all reported before any query runs. `location` is the
/// `Type.field` coordinate, with `(argument)` appended for argument errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("The query type '{0}' is not declared")]
    MissingQueryType(String),
    #[error("At {location}, {err}")]
    InvalidTypeRef {
        location: String,
        err: crate::TypeRefError,
    },
    #[error("At {location}, unknown type '{name}'")]
    UnknownType { location: String, name: String },
    #[error("At {location}, arguments can only be built of scalars but found '{ty}'")]
    InvalidArgumentType { location: String, ty: String },
    #[error("At {location}, the resolver produces {found} but the field is declared as {expected}")]
    ShapeMismatch {
        location: String,
        expected: String,
        found: String,
    },
    #[error("At {location}, the resolver produces {found} which can't be returned as {expected}")]
    ScalarTypeMismatch {
        location: String,
        expected: ScalarType,
        found: String,
    },
    #[error("At {location}, the resolver reads the undeclared argument '{argument}'")]
    UnknownArgument { location: String, argument: String },
    #[error("At {location}, the resolver reads the argument '{argument}' as {found} but it is declared as {declared}")]
    ArgumentTypeMismatch {
        location: String,
        argument: String,
        declared: String,
        found: String,
    },
    #[error("At {location}, {err}")]
    InvalidPath { location: String, err: MaterializeError },
}
