use value::ValueKind;

/// Why an expression could not produce a value. Absence is never one of them: a missing
/// optional value is a successful `Optional(absent)`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Type mismatch at {at}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Context path or operation that was evaluated.
        at: String,
        expected: String,
        found: ValueKind,
    },
    #[error("No value found at {path}")]
    MissingPath { path: String },
    #[error("{0}")]
    Arithmetic(String),
    #[error("Map element {0} is not bound")]
    UnboundElement(u32),
}

impl EvalError {
    pub(crate) fn type_mismatch(at: impl ToString, expected: impl ToString, found: ValueKind) -> Self {
        EvalError::TypeMismatch {
            at: at.to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}
