use std::fmt;

use remote::Expression;
use value::{AbsentPolicy, Value};

use crate::{ObjectId, ScalarType};

/// What runs when a field is resolved.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    pub kind: StepKind,
    /// How the executor completes the produced value, and which object's steps it re-enters.
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StepKind {
    /// Reads `key` off the current value. Anything but a record holding a non-null entry there
    /// gives absent.
    Passthrough { key: String },
    Constant(Value),
    Computed(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    Scalar(ScalarType),
    /// Fields selected on the produced value are resolved with this object's steps, in a child
    /// context whose current value is the produced value.
    Object(ObjectId),
    /// Each item is completed independently with the inner shape.
    List(Box<Shape>),
}

impl Shape {
    pub fn is_list(&self) -> bool {
        matches!(self.kind, ShapeKind::List(_))
    }

    /// Object found at the bottom of any list wrapping.
    pub fn object(&self) -> Option<ObjectId> {
        match &self.kind {
            ShapeKind::Scalar(_) => None,
            ShapeKind::Object(id) => Some(*id),
            ShapeKind::List(item) => item.object(),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Passthrough { key } => write!(f, "passthrough {key}"),
            StepKind::Constant(value) => write!(f, "constant {}", value.to_json(AbsentPolicy::Null)),
            StepKind::Computed(expression) => write!(f, "computed {expression}"),
        }
    }
}
